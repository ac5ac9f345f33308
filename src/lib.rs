pub mod api;
pub mod core;
pub mod playback;

pub use crate::api::{TransportCommand, ViewerSession};
pub use crate::core::{Result, ViewerConfig, ViewerError};

pub fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("ir_viewer_rust"),
        );
    }

    #[cfg(not(target_os = "android"))]
    {
        // RUST_LOG overrides; repeated calls are ignored
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    }
}
