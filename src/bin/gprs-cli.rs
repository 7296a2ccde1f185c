use clap::{Parser, Subcommand};
use gprs_rust::gprs_common_rs::packet::core::exceptions::GprsResult;
use gprs_rust::gprs_common_rs::packet::core::packet_input::PacketInput;
use gprs_rust::gprs_common_rs::packet::models::FlatReport;
use gprs_rust::gprs_common_rs::service::{BatchProcessor, BatchStats, DispatchOutcome, GprsService};
use gprs_rust::gprs_common_rs::utils::{init_logging, ConfigLoader};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gprs-cli")]
#[command(about = "GPRS コマンドパケットをフラットなレポートに変換する")]
#[command(version = "0.1.0")]
struct Cli {
    /// 設定ファイル (JSON / TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 同梱スキーマの代わりに使うレイアウト JSON
    #[arg(short, long, global = true)]
    schema: Option<String>,

    /// デバッグモード
    #[arg(short, long, global = true)]
    debug: bool,

    /// レポートを整形して出力
    #[arg(short, long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 1パケットを変換する
    #[command(alias = "p")]
    Parse {
        /// "0x02 0x05 0x03 ..." 形式のパケット
        packet: String,
    },
    /// ファイルの各行を1パケットとして並行に変換する
    #[command(alias = "b")]
    Batch {
        /// 入力ファイル
        #[arg(short, long)]
        file: PathBuf,
    },
    /// 使用中のレイアウトを表示する
    Schema,
}

fn render(report: &FlatReport, pretty: bool) -> Result<String, Box<dyn Error>> {
    Ok(if pretty { report.to_json_pretty()? } else { report.to_json()? })
}

fn print_outcome(outcome: GprsResult<DispatchOutcome>, pretty: bool) -> Result<(), Box<dyn Error>> {
    match outcome {
        Ok(DispatchOutcome::Report(report)) => println!("{}", render(&report, pretty)?),
        Ok(DispatchOutcome::NotCommand(_)) => println!("{{}}"),
        Ok(DispatchOutcome::Invalid(reason)) => eprintln!("❌ 不正なパケット: {}", reason),
        Err(e) => eprintln!("❌ 変換エラー: {}", e),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_paths(vec![path.clone()]),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if cli.debug {
        config.logging.level = "debug".into();
        config.dispatch.debug_packets = true;
    }
    if let Some(path) = &cli.schema {
        config.schema.path = Some(path.clone());
    }
    init_logging(&config.logging)?;

    let service = GprsService::from_config(&config)?;

    match cli.command {
        Commands::Parse { packet } => {
            print_outcome(service.process(packet.as_str()), cli.pretty)?;
        }
        Commands::Batch { file } => {
            let content = tokio::fs::read_to_string(&file).await?;
            let inputs: Vec<PacketInput> = content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(PacketInput::from)
                .collect();

            let processor = BatchProcessor::new(Arc::new(service));
            let results = processor.process_all(inputs).await;
            let stats = BatchStats::from_results(&results);
            for result in results {
                print_outcome(result, cli.pretty)?;
            }
            eprintln!(
                "✅ 完了: report={} not_command={} invalid={} failed={}",
                stats.reports, stats.not_command, stats.invalid, stats.failed
            );
        }
        Commands::Schema => {
            for line in service.schema().describe() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
