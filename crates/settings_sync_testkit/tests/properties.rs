//! Property tests over random edit sequences.

use proptest::prelude::*;
use settings_sync_engine::ids;
use settings_sync_protocol::CommitResponse;
use settings_sync_testkit::prelude::*;

fn config() -> ProptestConfig {
    PropTestConfig::quick().to_proptest_config()
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn invariants_hold_after_every_edit(edits in edit_sequence_strategy(1, 24)) {
        let page = runtime().block_on(TestPage::mock());
        for edit in &edits {
            edit.apply(&page.widgets);
            prop_assert_eq!(check_page(&page), Ok(()));
        }
    }

    #[test]
    fn cancel_restores_the_baseline(edits in edit_sequence_strategy(1, 16)) {
        let page = runtime().block_on(TestPage::mock());
        for edit in &edits {
            edit.apply(&page.widgets);
        }

        for id in ids::ALL {
            let baseline = page.engine.baseline(id);
            if page.affordance(id).cancel_enabled {
                prop_assert!(page.engine.cancel(id).is_ok());
                prop_assert_eq!(check_settled(&page, id), Ok(()));
            } else {
                prop_assert!(page.engine.cancel(id).is_err());
            }
            prop_assert_eq!(page.engine.baseline(id), baseline);
        }
        prop_assert_eq!(check_page(&page), Ok(()));
    }

    #[test]
    fn successful_save_settles_the_section(edits in edit_sequence_strategy(1, 16)) {
        let rt = runtime();
        let (page, server) = rt.block_on(TestPage::with_server());
        for edit in &edits {
            edit.apply(&page.widgets);
        }

        for id in ids::ALL {
            if !page.affordance(id).save_enabled {
                prop_assert!(rt.block_on(page.engine.save(id)).is_err());
                continue;
            }
            let expected = page.section_values(id);
            let saves = server.store().save_count(id);
            let result = rt.block_on(page.engine.save(id));
            prop_assert!(result.is_ok(), "{}: {:?}", id, result);

            prop_assert_eq!(server.store().save_count(id), saves + 1);
            prop_assert_eq!(check_settled(&page, id), Ok(()));
            let baseline = page.engine.baseline(id).unwrap_or_default();
            for (name, value) in expected.iter() {
                if !baseline.is_blank(name) {
                    prop_assert_eq!(baseline.get(name), Some(value));
                }
            }
        }
        prop_assert_eq!(check_page(&page), Ok(()));
    }

    #[test]
    fn failed_save_keeps_the_baseline(edits in edit_sequence_strategy(1, 16)) {
        let rt = runtime();
        let page = rt.block_on(TestPage::mock());
        for edit in &edits {
            edit.apply(&page.widgets);
        }

        for id in ids::ALL {
            if !page.affordance(id).save_enabled {
                continue;
            }
            let baseline = page.engine.baseline(id);
            let before = page.affordance(id);
            page.transport
                .push_response(&format!("/rest/setup/{id}"), CommitResponse::error("rejected"));

            prop_assert!(rt.block_on(page.engine.save(id)).is_err());
            prop_assert_eq!(page.engine.baseline(id), baseline);
            prop_assert_eq!(page.affordance(id), before);
            prop_assert_eq!(
                page.engine.notice(id).map(|n| n.message),
                Some("rejected".to_string())
            );
        }
    }

    #[test]
    fn loaded_documents_start_settled(doc in setup_document_strategy()) {
        let page = runtime().block_on(TestPage::mock_with(doc));
        for id in ids::ALL {
            prop_assert_eq!(check_settled(&page, id), Ok(()));
        }
    }
}

#[test]
fn fuzz_targets_survive_property_inputs() {
    let mut runner = proptest::test_runner::TestRunner::new(config());
    runner
        .run(&prop::collection::vec(any::<u8>(), 0..64), |data| {
            fuzz_field_map_decode(&data);
            fuzz_commit_request(&data);
            fuzz_server_post(&data);
            fuzz_page_edits(&data);
            Ok(())
        })
        .unwrap();
}
