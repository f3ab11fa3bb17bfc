// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use spur_engine::run_simulation;
use spur_engine::test_helpers::start_test;
use spur_models::endpoint::Endpoint;
use spur_models::error::BuildError;
use spur_models::leaf_spine::{LeafSpineConfig, LeafSpineFabric};
use spur_models::link::LinkProfile;

fn fast_profile() -> LinkProfile {
    LinkProfile::parse("1Gbps", "1us", "16").unwrap()
}

/// A 4x2 fabric is a complete bipartite graph: 8 links, every leaf linked to
/// both spines and every spine linked to all four leaves.
#[test]
fn fabric_dimensions() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ghz(1.0);
    let profile = fast_profile();

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 4,
        num_spines: 2,
    };
    let fabric = LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();

    assert_eq!(fabric.num_leaves(), 4);
    assert_eq!(fabric.num_spines(), 2);
    assert_eq!(fabric.links().len(), 8);

    for leaf in 0..4 {
        let degree = fabric.links().iter().filter(|l| l.leaf == leaf).count();
        assert_eq!(degree, 2);
    }
    for spine in 0..2 {
        let degree = fabric.links().iter().filter(|l| l.spine == spine).count();
        assert_eq!(degree, 4);
    }

    // Every link carries the installed profile.
    for fabric_link in fabric.links() {
        assert_eq!(fabric_link.link.profile(), &profile);
    }
}

/// The client lands on the first leaf and the server on the last one, each
/// behind an access link carrying the access profile rather than the fabric
/// one.
#[test]
fn attach_places_endpoints() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ghz(1.0);
    let profile = fast_profile();
    let access = LinkProfile::parse("2Gbps", "500ns", "8").unwrap();

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 4,
        num_spines: 2,
    };
    let fabric = LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();

    let client = Endpoint::new_and_register(&engine, top, "client", 0, 64).unwrap();
    let server = Endpoint::new_and_register(&engine, top, "server", 1, 64).unwrap();
    let attachment = fabric
        .attach(&engine, &clock, &client, &server, &access)
        .unwrap();

    assert_eq!(attachment.client_leaf, 0);
    assert_eq!(attachment.server_leaf, 3);
    assert_eq!(attachment.client_link.profile(), &access);
    assert_eq!(attachment.server_link.profile(), &access);
    assert_ne!(attachment.client_link.profile(), &profile);
}

/// Attaching to a fabric built with no leaves fails.
#[test]
fn attach_without_leaves_fails() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ghz(1.0);
    let profile = fast_profile();

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 0,
        num_spines: 2,
    };
    let fabric = LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();

    let client = Endpoint::new_and_register(&engine, top, "client", 0, 64).unwrap();
    let server = Endpoint::new_and_register(&engine, top, "server", 1, 64).unwrap();
    let result = fabric.attach(&engine, &clock, &client, &server, &profile);

    assert!(matches!(
        result,
        Err(BuildError::LeafIndex {
            index: 0,
            num_leaves: 0
        })
    ));
}

/// Traffic crosses the fabric: client on leaf 0, server on leaf 1, one spine
/// in between.
#[test]
fn end_to_end_across_spine() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ghz(1.0);
    let profile = fast_profile();

    const NUM_PACKETS: usize = 5;

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 2,
        num_spines: 1,
    };
    let fabric = LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();

    let client = Endpoint::new_and_register(&engine, top, "client", 0, 58).unwrap();
    let server = Endpoint::new_and_register(&engine, top, "server", 1, 58).unwrap();
    client.set_peer(server.address());
    client.set_num_to_send(Some(NUM_PACKETS));

    let attachment = fabric
        .attach(&engine, &clock, &client, &server, &profile)
        .unwrap();
    assert_eq!(attachment.client_leaf, 0);
    assert_eq!(attachment.server_leaf, 1);

    run_simulation!(engine);

    assert_eq!(client.num_sent(), NUM_PACKETS);
    assert_eq!(server.num_received(), NUM_PACKETS);
    assert_eq!(server.bytes_received(), NUM_PACKETS * 100);
}

/// The full-size fabric: 4 leaves, 2 spines, megabit links with millisecond
/// delays. Client on leaf 0 and server on leaf 3, so every packet crosses a
/// spine.
#[test]
fn end_to_end_four_leaves() {
    let mut engine = start_test(file!());
    // 1MHz keeps 10Mbps at a whole number of bits per tick.
    let clock = engine.clock_mhz(1.0);
    let profile = LinkProfile::parse("10Mbps", "2ms", "100").unwrap();

    const NUM_PACKETS: usize = 4;

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 4,
        num_spines: 2,
    };
    let fabric = LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();
    assert_eq!(fabric.links().len(), 8);

    let client = Endpoint::new_and_register(&engine, top, "client", 0, 58).unwrap();
    let server = Endpoint::new_and_register(&engine, top, "server", 1, 58).unwrap();
    client.set_peer(server.address());
    client.set_num_to_send(Some(NUM_PACKETS));

    let attachment = fabric
        .attach(&engine, &clock, &client, &server, &profile)
        .unwrap();
    assert_eq!(attachment.client_leaf, 0);
    assert_eq!(attachment.server_leaf, 3);

    run_simulation!(engine);

    assert_eq!(client.num_sent(), NUM_PACKETS);
    assert_eq!(server.num_received(), NUM_PACKETS);
}

/// With a single leaf both endpoints share it and traffic never touches the
/// spine, but delivery still works.
#[test]
fn single_leaf_local_delivery() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ghz(1.0);
    let profile = fast_profile();

    const NUM_PACKETS: usize = 3;

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 1,
        num_spines: 1,
    };
    let fabric = LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();

    let client = Endpoint::new_and_register(&engine, top, "client", 0, 58).unwrap();
    let server = Endpoint::new_and_register(&engine, top, "server", 1, 58).unwrap();
    client.set_peer(server.address());
    client.set_num_to_send(Some(NUM_PACKETS));

    let attachment = fabric
        .attach(&engine, &clock, &client, &server, &profile)
        .unwrap();
    assert_eq!(attachment.client_leaf, attachment.server_leaf);

    run_simulation!(engine);

    assert_eq!(server.num_received(), NUM_PACKETS);
}

/// Two fabrics built with the same parameters in one engine stay independent.
#[test]
fn two_fabrics_independent() {
    let mut engine = start_test(file!());
    let clock = engine.clock_ghz(1.0);
    let profile = fast_profile();

    let top = engine.top();
    let config = LeafSpineConfig {
        num_leaves: 2,
        num_spines: 1,
    };
    let fabric_a = LeafSpineFabric::build(&engine, &clock, top, "fabric_a", config, &profile).unwrap();
    let fabric_b = LeafSpineFabric::build(&engine, &clock, top, "fabric_b", config, &profile).unwrap();
    assert_eq!(fabric_a.links().len(), fabric_b.links().len());

    let client_a = Endpoint::new_and_register(&engine, top, "client_a", 0, 58).unwrap();
    let server_a = Endpoint::new_and_register(&engine, top, "server_a", 1, 58).unwrap();
    client_a.set_peer(server_a.address());
    client_a.set_num_to_send(Some(2));
    fabric_a
        .attach(&engine, &clock, &client_a, &server_a, &profile)
        .unwrap();

    let client_b = Endpoint::new_and_register(&engine, top, "client_b", 0, 58).unwrap();
    let server_b = Endpoint::new_and_register(&engine, top, "server_b", 1, 58).unwrap();
    client_b.set_peer(server_b.address());
    client_b.set_num_to_send(Some(3));
    fabric_b
        .attach(&engine, &clock, &client_b, &server_b, &profile)
        .unwrap();

    run_simulation!(engine);

    assert_eq!(server_a.num_received(), 2);
    assert_eq!(server_b.num_received(), 3);
    assert_eq!(server_a.bytes_sent(), 0);
    assert_eq!(server_b.bytes_sent(), 0);
}

/// Identical fabrics in two separate engines run to completion on their own,
/// with no state shared between the engines.
#[test]
fn two_engines_independent() {
    let config = LeafSpineConfig {
        num_leaves: 2,
        num_spines: 1,
    };

    let run_one = |num_packets: usize| {
        let mut engine = start_test(file!());
        let clock = engine.clock_ghz(1.0);
        let profile = fast_profile();

        let top = engine.top();
        let fabric =
            LeafSpineFabric::build(&engine, &clock, top, "fabric", config, &profile).unwrap();
        let client = Endpoint::new_and_register(&engine, top, "client", 0, 58).unwrap();
        let server = Endpoint::new_and_register(&engine, top, "server", 1, 58).unwrap();
        client.set_peer(server.address());
        client.set_num_to_send(Some(num_packets));
        fabric
            .attach(&engine, &clock, &client, &server, &profile)
            .unwrap();

        run_simulation!(engine);
        (server.num_received(), engine.time_now_ns())
    };

    let (received_a, elapsed_a) = run_one(2);
    let (received_b, elapsed_b) = run_one(5);

    assert_eq!(received_a, 2);
    assert_eq!(received_b, 5);
    // The second engine starts from time zero again, so sending more packets
    // through the same topology takes strictly longer.
    assert!(elapsed_b > elapsed_a);
}
