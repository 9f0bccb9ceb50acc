//! Property tests over full workflows.
//!
//! Parties are created once; key generation dominates otherwise.

use std::sync::OnceLock;

use proptest::prelude::*;
use tokio::runtime::Runtime;

use keyward::{Vault, VaultError};
use keyward_testkit::generators::upload_request;
use keyward_testkit::TestNetwork;

struct World {
    runtime: Runtime,
    _network: TestNetwork,
    alice: Vault,
    bob: Vault,
    carol: Vault,
}

fn world() -> &'static World {
    static WORLD: OnceLock<World> = OnceLock::new();
    WORLD.get_or_init(|| {
        let runtime = Runtime::new().unwrap();
        let network = TestNetwork::new();
        let (alice, bob, carol) = runtime.block_on(async {
            (
                network.registered("alice").await.unwrap(),
                network.registered("bob").await.unwrap(),
                network.registered("carol").await.unwrap(),
            )
        });
        World {
            runtime,
            _network: network,
            alice,
            bob,
            carol,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_upload_retrieve_roundtrip(request in upload_request(4096)) {
        let w = world();
        let expected = request.clone();
        let file = w.runtime.block_on(async {
            let receipt = w.alice.upload(request).await.unwrap();
            w.alice.retrieve(&receipt.file_id).await.unwrap()
        });
        prop_assert_eq!(file.bytes, expected.bytes);
        prop_assert_eq!(file.file_name, expected.file_name);
        prop_assert_eq!(file.mime_type, expected.mime_type);
    }

    #[test]
    fn prop_grant_gives_access_to_requester_only(request in upload_request(1024)) {
        let w = world();
        let expected = request.bytes.clone();
        w.runtime.block_on(async {
            let receipt = w.alice.upload(request).await.unwrap();

            assert!(matches!(
                w.bob.retrieve(&receipt.file_id).await,
                Err(VaultError::NoAccess { .. })
            ));

            let request_id = w.bob.request_access(&receipt.file_id).await.unwrap();
            w.alice.approve(&request_id).await.unwrap();

            assert_eq!(w.bob.retrieve(&receipt.file_id).await.unwrap().bytes, expected);
            assert!(matches!(
                w.carol.retrieve(&receipt.file_id).await,
                Err(VaultError::NoAccess { .. })
            ));
        });
    }
}
