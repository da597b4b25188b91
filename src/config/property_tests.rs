//! Property-based tests for configuration module
//!
//! These tests use proptest to generate random configurations and verify
//! validation and serialization round-trips.

use super::*;
use proptest::prelude::*;

prop_compose! {
    fn valid_window_config()(
        width in 1u32..4096u32,
        height in 1u32..4096u32,
        title in "[A-Za-z0-9 ]{0,32}",
        app_id in "[a-z][a-z0-9.-]{0,16}",
    ) -> WindowConfig {
        WindowConfig { width, height, title, app_id }
    }
}

prop_compose! {
    fn valid_animation_config()(
        initial_level in any::<u8>(),
        initial_direction in prop_oneof![Just(Direction::Lighten), Just(Direction::Darken)],
    ) -> AnimationConfig {
        AnimationConfig { initial_level, initial_direction }
    }
}

prop_compose! {
    fn valid_config()(
        window in valid_window_config(),
        animation in valid_animation_config(),
        name in "[a-z_]{1,16}",
    ) -> PlaygroundConfig {
        PlaygroundConfig {
            window,
            animation,
            shm: ShmConfig { name_prefix: format!("/{}", name) },
        }
    }
}

proptest! {
    #[test]
    fn prop_generated_configs_validate(config in valid_config()) {
        prop_assert!(config.validate().is_ok());
    }

    #[test]
    fn prop_toml_roundtrip(config in valid_config()) {
        let text = toml::to_string(&config).unwrap();
        let back: PlaygroundConfig = toml::from_str(&text).unwrap();
        prop_assert_eq!(back, config);
    }

    #[test]
    fn prop_pool_always_holds_two_frames(window in valid_window_config()) {
        let layout = window.layout();
        prop_assert_eq!(layout.pool_size(), layout.frame_size() * 2);
        prop_assert!(layout.slot(0).is_ok());
    }
}
