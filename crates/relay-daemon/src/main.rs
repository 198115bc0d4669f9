//! Standalone relay daemon CLI.

use clap::{Parser, Subcommand};
use relay_core::config::RelayConfig;
use relay_core::error::RelayError;
use relay_core::logging::{init_logging, LogConfig, LogFormat};
use relay_daemon::runtime;

#[derive(Parser)]
#[command(name = "relay-daemon")]
#[command(about = "TickRelay Standalone Relay Daemon", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (없으면 config/default + 환경 변수)
    #[arg(long)]
    config: Option<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 데몬 모드: 허브와 포트를 띄우고 상시 실행
    Daemon {
        /// 외부 연결 없이 시뮬레이션 피드로 실행
        #[arg(long)]
        simulate: bool,

        /// 관심 잔고 키 목록 (쉼표 구분, 예: "0xabc:UNISWAP,0xdef:PERP")
        #[arg(long)]
        track: Option<String>,
    },

    /// 기본 스냅샷 단발 조회
    Snapshot,
}

/// 설정의 로그 형식 문자열을 파싱합니다.
///
/// 오타 난 형식이 조용히 기본값으로 떨어지지 않도록 로드 단계에서
/// 설정 에러로 끌어올립니다.
fn parse_log_format(raw: &str) -> Result<LogFormat, RelayError> {
    raw.parse().map_err(RelayError::Config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // 설정 로드
    let config = match &cli.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::load_default()?,
    };

    // 로깅 초기화 (CLI 레벨이 설정 파일보다 우선)
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let format = parse_log_format(&config.logging.format)?;
    init_logging(LogConfig::new(level).with_format(format))?;

    tracing::info!("TickRelay 데몬 시작");

    match cli.command {
        Commands::Daemon { simulate, track } => {
            runtime::run_daemon(config, simulate, track).await?;
        }
        Commands::Snapshot => {
            runtime::run_snapshot(config).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_format_accepts_known_formats() {
        assert_eq!(parse_log_format("json").unwrap(), LogFormat::Json);
        assert_eq!(parse_log_format("pretty").unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_parse_log_format_rejects_typo() {
        // 오타가 기본 형식으로 조용히 대체되면 안 된다
        let err = parse_log_format("prety").unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }
}
