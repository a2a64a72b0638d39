use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quotepress", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pages on a site (title and id).
    Pages(PagesArgs),
    /// Generate, upload, and distribute a job.
    Run(RunArgs),
}

#[derive(Parser, Debug)]
struct PagesArgs {
    /// Credentials JSON (array of site entries).
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Site URL to use, as listed in the credentials file.
    #[arg(long)]
    site: String,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Credentials JSON (array of site entries).
    #[arg(long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Site URL to use, as listed in the credentials file.
    #[arg(long)]
    site: String,

    /// Input job JSON.
    #[arg(long)]
    job: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Pages(args) => cmd_pages(args),
        Command::Run(args) => cmd_run(args),
    }
}

fn client_for(credentials: &Path, site: &str) -> anyhow::Result<quotepress::WpClient> {
    let creds = quotepress::wp::load_credentials(credentials)?;
    let site_creds = quotepress::wp::find_site(&creds, site)
        .with_context(|| format!("site '{site}' not present in '{}'", credentials.display()))?;
    Ok(quotepress::WpClient::new(site_creds))
}

fn read_job_json(path: &Path) -> anyhow::Result<quotepress::JobSpec> {
    let f = File::open(path).with_context(|| format!("open job '{}'", path.display()))?;
    let r = BufReader::new(f);
    let job: quotepress::JobSpec = serde_json::from_reader(r).context("parse job JSON")?;
    Ok(job)
}

fn cmd_pages(args: PagesArgs) -> anyhow::Result<()> {
    let client = client_for(&args.credentials, &args.site)?;
    let pages = client.list_pages()?;
    if pages.is_empty() {
        eprintln!("no pages found on {}", args.site);
        return Ok(());
    }
    for page in pages {
        println!("{:>8}  {}", page.id, page.title);
    }
    Ok(())
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let job = read_job_json(&args.job)?;
    job.validate()?;

    let client = client_for(&args.credentials, &args.site)?;

    let font_bytes = std::fs::read(&job.font_file)
        .with_context(|| format!("read font '{}'", job.font_file))?;
    let font_size = job.font_size.unwrap_or(quotepress::DEFAULT_FONT_SIZE);

    let started = std::time::Instant::now();
    let handle = quotepress::worker::spawn(
        move || -> quotepress::QuotepressResult<quotepress::RunReport> {
            let mut typesetter = quotepress::QuoteTypesetter::new(font_bytes, font_size)?;
            quotepress::run_job(&job, &client, &quotepress::GalleryRenderer, &mut typesetter)
        },
    );

    while !handle.is_done() {
        std::thread::sleep(Duration::from_millis(200));
    }
    let report = handle.join()??;

    eprintln!(
        "done in {:.2}s: {} generated, {} uploaded, {} failed",
        started.elapsed().as_secs_f64(),
        report.generated,
        report.uploaded,
        report.failed_uploads
    );
    Ok(())
}
