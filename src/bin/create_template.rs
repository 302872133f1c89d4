use clap::Parser;
use reddit_tracker::app::template::{TemplateWriter, INSTRUCTIONS};
use reddit_tracker::utils::logger;
use reddit_tracker::LocalStorage;

#[derive(Debug, Parser)]
#[command(name = "create_template")]
#[command(about = "Write starter spreadsheets with a comment_url column")]
struct TemplateArgs {
    /// Directory to write the templates into
    #[arg(short, long, default_value = ".")]
    out_dir: String,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = TemplateArgs::parse();
    logger::init_cli_logger(args.verbose);

    println!("Creating template files...\n");
    let storage = LocalStorage::new(&args.out_dir);
    let written = TemplateWriter::new(&storage).create_all().await?;

    for name in &written {
        println!("✅ Template created: {}", storage.resolve(name).display());
    }
    println!("\nInstructions:");
    for line in INSTRUCTIONS {
        println!("{}", line);
    }
    println!("\nColumn name: comment_url (do not change!)");
    println!("\n✅ Templates ready to use!");
    Ok(())
}
