//! Property-based tests for Settings serialization round-trip and zoom bounds.

use hideout::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use hideout::types::settings::{SearchEngine, Settings, MAX_ZOOM, MIN_ZOOM};
use proptest::prelude::*;
use serde_json::json;

fn arb_engine() -> impl Strategy<Value = SearchEngine> {
    prop::sample::select(SearchEngine::ALL.to_vec())
}

fn arb_settings() -> impl Strategy<Value = Settings> {
    (arb_engine(), 50u32..=200).prop_map(|(search_engine, pct)| Settings {
        search_engine,
        zoom: f64::from(pct) / 100.0,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn settings_json_roundtrip(settings in arb_settings()) {
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, settings);
    }

    #[test]
    fn zoom_steps_stay_in_bounds(start in arb_settings(), steps in prop::collection::vec(any::<bool>(), 0..40)) {
        let mut engine = SettingsEngine::new(start);
        for up in steps {
            let zoom = if up { engine.zoom_in() } else { engine.zoom_out() };
            prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&zoom), "zoom {}", zoom);
            prop_assert_eq!(engine.get_settings().zoom, zoom);
        }
    }

    #[test]
    fn out_of_range_zoom_is_rejected(zoom in prop_oneof![-10.0f64..0.49, 2.01f64..10.0]) {
        let mut engine = SettingsEngine::default();
        prop_assert!(engine.set_value("zoom", json!(zoom)).is_err());
        prop_assert_eq!(engine.get_settings(), &Settings::default());
    }

    #[test]
    fn search_engine_set_by_name(engine_choice in arb_engine()) {
        let mut engine = SettingsEngine::default();
        engine.set_value("searchEngine", json!(engine_choice.name())).unwrap();
        prop_assert_eq!(engine.get_settings().search_engine, engine_choice);
    }
}
