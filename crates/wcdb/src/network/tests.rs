use super::*;

fn ring(n: usize, network_type: NetworkType) -> Network {
    Topology::RingFull
        .build(&TopologyParams {
            servers: n,
            network_type,
            ..Default::default()
        })
        .unwrap()
}

#[test]
fn full_ring_edges_follow_first_appearance() {
    let net = ring(4, NetworkType::Symmetric);
    assert_eq!(net.num_servers(), 4);
    assert_eq!(net.num_flows(), 4);
    let expect: Vec<Edge> = [(0, 1), (1, 2), (2, 3), (3, 0)]
        .into_iter()
        .map(Edge::from)
        .collect();
    assert_eq!(net.edges(), expect.as_slice());
}

#[test]
fn symmetric_cycle_detection() {
    assert_eq!(ring(5, NetworkType::Symmetric).symmetric_cycle(), Some(5));
    assert_eq!(ring(5, NetworkType::AsymmetricFlow).symmetric_cycle(), None);
    assert_eq!(ring(5, NetworkType::AsymmetricServer).symmetric_cycle(), None);
    let semi = Topology::RingSemi
        .build(&TopologyParams {
            servers: 6,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(semi.symmetric_cycle(), Some(6));
    let tandem = Topology::TandemSinkTree
        .build(&TopologyParams::default())
        .unwrap();
    assert_eq!(tandem.symmetric_cycle(), None);
}

#[test]
fn scaling_by_one_is_identity_and_latency_is_never_scaled() {
    let net = ring(3, NetworkType::AsymmetricServer);
    assert_eq!(net.scaled(1.0), net);
    let s = net.scaled(0.1);
    for (a, b) in net.servers().iter().zip(s.servers()) {
        assert_eq!(a.service_curves[0].latency, b.service_curves[0].latency);
        assert!((a.service_curves[0].rate * 0.1 - b.service_curves[0].rate).abs() < 1e-6);
        assert!((a.shapers[0].rho * 0.1 - b.shapers[0].rho).abs() < 1e-6);
    }
    for (a, b) in net.flows().iter().zip(s.flows()) {
        assert_eq!(a.path, b.path);
        assert!((a.arrival_curves[0].sigma * 0.1 - b.arrival_curves[0].sigma).abs() < 1e-12);
    }
    assert_eq!(net.edges(), s.edges());
}

#[test]
fn rejects_bad_paths_and_parameters() {
    let server = Server::new(vec![RateLatency::new(1.0, 0.0)], vec![]);
    let flow = |path: Vec<usize>| Flow::new(vec![TokenBucket::new(1.0, 0.1)], path);
    assert!(Network::new(vec![server.clone()], vec![flow(vec![])]).is_err());
    assert!(Network::new(vec![server.clone()], vec![flow(vec![0, 1])]).is_err());
    let neg = Server::new(vec![RateLatency::new(-1.0, 0.0)], vec![]);
    assert!(Network::new(vec![neg], vec![flow(vec![0])]).is_err());
    assert!(Network::new(vec![server], vec![flow(vec![0])]).is_ok());
}

#[test]
fn topology_params_are_validated() {
    let bad_load = TopologyParams {
        load: 1.5,
        ..Default::default()
    };
    assert!(Topology::RingFull.build(&bad_load).is_err());
    let asym_mesh = TopologyParams {
        servers: 2,
        network_type: NetworkType::AsymmetricFlow,
        ..Default::default()
    };
    assert!(Topology::MeshSimple.build(&asym_mesh).is_err());
}

#[test]
fn mesh_and_tandem_shapes() {
    let mesh = Topology::MeshSimple
        .build(&TopologyParams {
            servers: 3,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(mesh.num_servers(), 7);
    assert_eq!(mesh.num_flows(), 8);
    assert_eq!(mesh.flows()[0].path, vec![0, 2, 4, 6]);
    assert_eq!(mesh.flows()[7].path, vec![1, 3, 5, 6]);

    let ss = Topology::TandemSourceSink
        .build(&TopologyParams {
            servers: 4,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(ss.num_flows(), 7);
    assert_eq!(ss.edges().len(), 3);

    let complete = Topology::RingCompleteFull
        .build(&TopologyParams {
            servers: 3,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(complete.num_flows(), 9);
    assert_eq!(complete.flows()[0].path, vec![0, 1, 2]);
    assert_eq!(complete.flows()[2].path, vec![0]);
}

#[test]
fn network_json_round_trip_recomputes_edges() {
    let net = ring(4, NetworkType::AsymmetricFlow);
    let s = serde_json::to_string(&net).unwrap();
    let back: Network = serde_json::from_str(&s).unwrap();
    assert_eq!(back, net);
    assert!(serde_json::from_str::<Network>(
        r#"{"servers":[],"flows":[{"arrival_curves":[],"path":[0]}]}"#
    )
    .is_err());
}
