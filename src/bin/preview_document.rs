//! Open a preview session for one subject and print the resulting view.
//!
//! Usage:
//!   preview_document <subject-id> [--download]
//!                    [--embedded-file PATH --content-type TYPE]

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kyc_document_preview::app::{PreviewConfig, PreviewController};
use kyc_document_preview::domain::{SubjectId, TransportStrategy};
use kyc_document_preview::infra::{EmbeddedDocumentProbe, FileDownloadLauncher, build_probe};

struct Args {
    subject: Option<SubjectId>,
    download: bool,
    embedded_file: Option<String>,
    content_type: Option<String>,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut subject = None;
        let mut download = false;
        let mut embedded_file = None;
        let mut content_type = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--download" => download = true,
                "--embedded-file" => {
                    embedded_file = Some(args.next().context("--embedded-file needs a path")?);
                }
                "--content-type" => {
                    content_type = Some(args.next().context("--content-type needs a value")?);
                }
                flag if flag.starts_with("--") => bail!("Unknown flag {}", flag),
                raw => subject = SubjectId::parse_optional(Some(raw))?,
            }
        }

        if embedded_file.is_some() != content_type.is_some() {
            bail!("--embedded-file and --content-type must be given together");
        }

        Ok(Self {
            subject,
            download,
            embedded_file,
            content_type,
        })
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let args = Args::parse()?;
    let mut config = PreviewConfig::from_env()?;

    let mut embedded = EmbeddedDocumentProbe::new();
    if let (Some(path), Some(content_type), Some(subject)) =
        (&args.embedded_file, &args.content_type, &args.subject)
    {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path))?;
        embedded.insert(subject.clone(), content_type, &bytes);
        config.transport = TransportStrategy::EmbeddedPayload;
    }

    let probe = build_probe(&config, embedded)?;
    let launcher = Arc::new(FileDownloadLauncher::new(&config)?);
    let controller = PreviewController::new(probe, launcher.clone(), &config);

    controller.open(args.subject);
    let session = controller.wait_settled().await;
    info!(status = session.status().as_str(), "Preview settled");

    println!("{}", serde_json::to_string_pretty(&controller.render())?);

    if args.download {
        if controller.download() {
            launcher.wait_idle().await;
        } else {
            info!("Nothing to download");
        }
    }

    controller.close();
    Ok(())
}
