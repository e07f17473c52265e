pub mod analytics;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod service;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    use crate::service::NoiseSeed;

    const DEFAULT_DATA_DIR: &str = "static";
    const DEFAULT_PORT: u16 = 8000;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub data_dir: Option<String>,
        pub noise_seed: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                data_dir: std::env::var("CROPCAST_DATA_DIR").ok(),
                noise_seed: std::env::var("CROPCAST_SEED").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                port: std::env::var("PORT").ok(),
            })
        }

        pub fn data_dir(&self) -> PathBuf {
            self.data_dir
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_DATA_DIR)
                .into()
        }

        pub fn noise_seed(&self) -> anyhow::Result<NoiseSeed> {
            match self.noise_seed.as_deref().map(str::trim) {
                None | Some("") => Ok(NoiseSeed::Entropy),
                Some(s) => {
                    let seed = s
                        .parse::<u64>()
                        .with_context(|| format!("CROPCAST_SEED must be a u64 (got {s:?})"))?;
                    Ok(NoiseSeed::Fixed(seed))
                }
            }
        }

        pub fn port(&self) -> anyhow::Result<u16> {
            match self.port.as_deref().map(str::trim) {
                None | Some("") => Ok(DEFAULT_PORT),
                Some(s) => s
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {s:?})")),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn defaults_apply_when_unset() {
            let settings = Settings::default();
            assert_eq!(settings.data_dir(), PathBuf::from("static"));
            assert_eq!(settings.noise_seed().unwrap(), NoiseSeed::Entropy);
            assert_eq!(settings.port().unwrap(), 8000);
        }

        #[test]
        fn parses_seed_and_rejects_garbage() {
            let mut settings = Settings {
                noise_seed: Some(" 42 ".to_string()),
                ..Default::default()
            };
            assert_eq!(settings.noise_seed().unwrap(), NoiseSeed::Fixed(42));

            settings.noise_seed = Some("forty-two".to_string());
            assert!(settings.noise_seed().is_err());
        }

        #[test]
        fn rejects_out_of_range_port() {
            let settings = Settings {
                port: Some("70000".to_string()),
                ..Default::default()
            };
            assert!(settings.port().is_err());
        }
    }
}
