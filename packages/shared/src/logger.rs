//! Logging setup utilities for the Hiroba binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library crates whose log output is enabled alongside the binary's own.
const WORKSPACE_CRATES: [&str; 3] = ["hiroba_shared", "hiroba_server", "hiroba_client"];

/// Build the default `EnvFilter` directive used when `RUST_LOG` is not set.
///
/// Every workspace crate and the binary itself are enabled at `default_log_level`.
pub fn default_filter_directive(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");

    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, default_log_level))
        .collect();
    if !WORKSPACE_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }

    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "hiroba-server", "hiroba-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger("hiroba-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_directive_enables_workspace_crates() {
        // テスト項目: ワークスペースの全クレートが指定レベルで有効になる
        // given (前提条件):
        let binary_name = "hiroba-server";

        // when (操作):
        let directive = default_filter_directive(binary_name, "debug");

        // then (期待する結果):
        assert!(directive.contains("hiroba_shared=debug"));
        assert!(directive.contains("hiroba_server=debug"));
        assert!(directive.contains("hiroba_client=debug"));
        // バイナリ名はクレート名と重複するため二重に追加されない
        assert_eq!(directive.matches("hiroba_server=").count(), 1);
    }

    #[test]
    fn test_default_filter_directive_adds_unknown_binary() {
        // テスト項目: ワークスペース外のバイナリ名もフィルタに追加される
        // given (前提条件):
        let binary_name = "relay-bench";

        // when (操作):
        let directive = default_filter_directive(binary_name, "info");

        // then (期待する結果):
        assert!(directive.ends_with("relay_bench=info"));
    }
}
