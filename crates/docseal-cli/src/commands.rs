use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colored::Colorize;
use docseal_sdk::{
    AnchorStatus, AuditReport, DocSeal, DocSealConfig, DocumentChanges, DocumentSummary,
    DocumentView, LedgerStatus, NewDocument, VerificationResult, VersionId,
};
use serde::Serialize;

use crate::cli::*;

const DEFAULT_CONFIG_FILE: &str = "docseal.toml";
const ROOT_ENV: &str = "DOCSEAL_ROOT";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref(), cli.root.clone())?;
    let format = cli.format;

    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    tracing::debug!(root = %config.storage.root.display(), "opening docseal");
    let docseal = DocSeal::open(config).context("failed to open document store")?;

    match cli.command {
        Command::Create(args) => cmd_create(&docseal, args, format).await,
        Command::Show(args) => cmd_show(&docseal, args, format),
        Command::Update(args) => cmd_update(&docseal, args, format).await,
        Command::Delete(args) => cmd_delete(&docseal, args, format).await,
        Command::Search(args) => {
            let results = docseal.search_documents(&args.term)?;
            print_summaries(&results, format)
        }
        Command::List => {
            let results = docseal.list_documents()?;
            print_summaries(&results, format)
        }
        Command::Download(args) => cmd_download(&docseal, args, format),
        Command::Verify(args) => cmd_verify(&docseal, args, format),
        Command::Log(args) => cmd_log(&docseal, args, format),
        Command::Audit => cmd_audit(&docseal, format),
        Command::Config => Ok(()),
    }
}

/// Explicit `--config`, else `./docseal.toml` if present, else defaults.
/// `--root` beats `DOCSEAL_ROOT`, which beats the file.
fn resolve_config(path: Option<&Path>, root: Option<PathBuf>) -> anyhow::Result<DocSealConfig> {
    let mut config = match path {
        Some(path) => DocSealConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            DocSealConfig::load(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => DocSealConfig::default(),
    };
    if let Some(root) = root.or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from)) {
        config.storage.root = root;
    }
    Ok(config)
}

async fn cmd_create(docseal: &DocSeal, args: CreateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let content = read_content(&args.file)?;
    let view = docseal
        .create_document(NewDocument {
            title: args.title,
            description: args.description,
            content,
            mime_type: args.mime,
            created_by: args.author,
        })
        .await?;

    if format == OutputFormat::Json {
        return print_json(&view);
    }
    println!("{} Created document {}", "✓".green().bold(), view.document_id);
    print_view(&view);
    Ok(())
}

fn cmd_show(docseal: &DocSeal, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let details = docseal.get_document(&args.id, args.include_deleted)?;
    if format == OutputFormat::Json {
        return print_json(&details);
    }

    println!("{} {}", "Document".bold(), details.document.document_id);
    print_view(&details.document);
    if let Some(deleted_at) = details.deleted_at {
        println!("  Deleted:     {}", deleted_at.to_rfc3339().red());
    }
    println!();
    println!("{}", "Versions:".bold());
    for version in &details.versions {
        let anchor = version
            .anchor_sequence
            .map(|seq| format!("#{seq}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<5} {} {:>10}  {:<6} {}  {}",
            version.version_id.to_string().yellow(),
            version.content_hash.short_hex().dimmed(),
            version.size,
            anchor,
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.created_by,
        );
    }
    Ok(())
}

async fn cmd_update(docseal: &DocSeal, args: UpdateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let content = args.file.as_deref().map(read_content).transpose()?;
    let changes = DocumentChanges {
        title: args.title,
        description: args.description,
        content,
        mime_type: args.mime,
        updated_by: args.author,
    };
    if changes.is_empty() {
        bail!("nothing to update: pass --title, --description or --file");
    }

    let view = docseal
        .update_document(&args.id, VersionId::new(args.expected), changes)
        .await?;

    if format == OutputFormat::Json {
        return print_json(&view);
    }
    println!(
        "{} Updated document {} to {}",
        "✓".green().bold(),
        view.document_id,
        view.current_version_id
    );
    print_view(&view);
    Ok(())
}

async fn cmd_delete(docseal: &DocSeal, args: DeleteArgs, format: OutputFormat) -> anyhow::Result<()> {
    let ack = docseal
        .delete_document(&args.id, VersionId::new(args.expected))
        .await?;
    if format == OutputFormat::Json {
        return print_json(&ack);
    }
    println!(
        "{} Deleted document {} at {}",
        "✓".green().bold(),
        ack.document_id,
        ack.deleted_at.to_rfc3339()
    );
    Ok(())
}

fn cmd_download(docseal: &DocSeal, args: DownloadArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (bytes, hash) = match args.version {
        Some(version) => docseal.download_version(&args.id, VersionId::new(version))?,
        None => docseal.download_content(&args.id)?,
    };

    let Some(output) = args.output else {
        std::io::stdout().lock().write_all(&bytes)?;
        return Ok(());
    };
    std::fs::write(&output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if format == OutputFormat::Json {
        #[derive(Serialize)]
        struct Downloaded<'a> {
            document_id: String,
            content_hash: String,
            size: usize,
            path: &'a Path,
        }
        return print_json(&Downloaded {
            document_id: args.id.to_string(),
            content_hash: hash.to_hex(),
            size: bytes.len(),
            path: &output,
        });
    }
    println!(
        "{} Wrote {} bytes to {} ({})",
        "✓".green().bold(),
        bytes.len(),
        output.display(),
        hash.short_hex()
    );
    Ok(())
}

fn cmd_verify(docseal: &DocSeal, args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let result = match args.version {
        Some(version) => docseal.verify_version(&args.id, VersionId::new(version))?,
        None => docseal.verify_document(&args.id)?,
    };

    if format == OutputFormat::Json {
        print_json(&result)?;
    } else {
        print_verification(&result);
    }
    if !result.matches {
        bail!("verification failed for {}@{}", result.document_id, result.version_id);
    }
    Ok(())
}

fn cmd_log(docseal: &DocSeal, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let records = docseal.ledger_log(args.limit)?;
    if format == OutputFormat::Json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("Ledger is empty.");
        return Ok(());
    }

    for record in &records {
        let status = match record.status {
            AnchorStatus::Confirmed => record.status.to_string().green(),
            AnchorStatus::Pending => record.status.to_string().yellow(),
            AnchorStatus::Failed => record.status.to_string().red(),
        };
        println!(
            "{:>6}  {}  {:<9}  {}  {}",
            format!("#{}", record.sequence).yellow(),
            record.record_hash.short_hex().dimmed(),
            status,
            record.content_hash.short_hex(),
            record.version,
        );
        println!("        {}", record.anchored_at.to_rfc3339().dimmed());
    }
    Ok(())
}

fn cmd_audit(docseal: &DocSeal, format: OutputFormat) -> anyhow::Result<()> {
    let report = docseal.audit()?;
    if format == OutputFormat::Json {
        print_json(&report)?;
    } else {
        print_audit(&report);
    }
    if !report.is_clean() {
        bail!("audit found integrity problems");
    }
    Ok(())
}

// ---- Output helpers ----

fn read_content(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ledger_label(status: LedgerStatus) -> colored::ColoredString {
    match status {
        LedgerStatus::Confirmed => status.to_string().green(),
        LedgerStatus::Unanchored => status.to_string().red(),
    }
}

fn print_view(view: &DocumentView) {
    println!("  Title:       {}", view.title);
    if !view.description.is_empty() {
        println!("  Description: {}", view.description);
    }
    println!("  Version:     {}", view.current_version_id);
    println!("  Hash:        {}", view.content_hash);
    println!("  Size:        {} bytes ({})", view.size, view.mime_type);
    println!("  Created:     {}", view.created_at.to_rfc3339());
    println!("  Ledger:      {}", ledger_label(view.ledger_status));
}

fn print_summaries(results: &[DocumentSummary], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        return print_json(&results);
    }
    if results.is_empty() {
        println!("No documents found.");
        return Ok(());
    }
    for doc in results {
        println!(
            "{}  {}  {:>10}  {}",
            doc.document_id.to_string().yellow(),
            ledger_label(doc.ledger_status),
            doc.size,
            doc.title.bold(),
        );
    }
    println!("{} document(s)", results.len());
    Ok(())
}

fn print_verification(result: &VerificationResult) {
    if result.matches {
        println!(
            "{} {}@{} verified",
            "✓".green().bold(),
            result.document_id,
            result.version_id
        );
    } else {
        println!(
            "{} {}@{} drifted",
            "✗".red().bold(),
            result.document_id,
            result.version_id
        );
    }
    println!("  Expected:  {}", result.expected_hash);
    match result.content_hash {
        Some(hash) => println!("  Computed:  {hash}"),
        None => println!("  Computed:  {}", "(content missing)".red()),
    }
    println!("  Ledger:    {}", ledger_label(result.ledger_status));
    if let Some(drift) = &result.drift {
        println!("  Reason:    {}", drift.to_string().red());
    }
}

fn print_audit(report: &AuditReport) {
    let drifted: Vec<_> = report.drifted().collect();
    println!(
        "Checked {} version(s), {} drifted",
        report.versions.len(),
        drifted.len()
    );
    for result in drifted {
        let reason = result
            .drift
            .map(|d| d.to_string())
            .unwrap_or_default();
        println!(
            "  {} {}@{}: {}",
            "✗".red().bold(),
            result.document_id,
            result.version_id,
            reason
        );
    }

    let ledger = &report.ledger;
    println!(
        "Ledger: {} record(s), {} confirmed, {} failed",
        ledger.record_count, ledger.confirmed, ledger.failed
    );
    for violation in &ledger.violations {
        println!(
            "  {} #{}: {}",
            "✗".red().bold(),
            violation.sequence,
            violation.description
        );
    }

    if report.is_clean() {
        println!("{} No integrity problems found", "✓".green().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_create_with_defaults() {
        let cli = Cli::try_parse_from(["docseal", "create", "--title", "Report", "--file", "r.pdf"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Text);
        match cli.command {
            Command::Create(args) => {
                assert_eq!(args.title, "Report");
                assert_eq!(args.description, "");
                assert_eq!(args.file, PathBuf::from("r.pdf"));
                assert!(args.mime.is_none());
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn rejects_malformed_document_id() {
        assert!(Cli::try_parse_from(["docseal", "show", "not-a-uuid"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docseal", "log", "-n", "5", "--format", "json", "--root", "/tmp/ds",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.root, Some(PathBuf::from("/tmp/ds")));
        match cli.command {
            Command::Log(args) => assert_eq!(args.limit, 5),
            _ => panic!("expected log"),
        }
    }

    #[test]
    fn root_flag_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docseal.toml");
        std::fs::write(&path, "[storage]\nroot = \"/from/file\"\n").unwrap();

        let config = resolve_config(Some(&path), None).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/from/file"));

        let config = resolve_config(Some(&path), Some(PathBuf::from("/from/flag"))).unwrap();
        assert_eq!(config.storage.root, PathBuf::from("/from/flag"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_config(Some(&dir.path().join("absent.toml")), None).is_err());
    }
}
