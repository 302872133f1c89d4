use clap::{Parser, ValueEnum};
use reddit_tracker::core::Storage;
use reddit_tracker::deploy::DeployConfig;
use reddit_tracker::utils::{logger, validation::Validate};
use reddit_tracker::LocalStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Artifact {
    Supervisor,
    Nginx,
    NginxContainer,
    Firewall,
    Dockerfile,
    All,
}

#[derive(Debug, Parser)]
#[command(name = "deploy_config")]
#[command(about = "Render supervisor, nginx, firewall and container files")]
struct DeployArgs {
    #[arg(value_enum, default_value = "all")]
    artifact: Artifact,

    /// Write files under this directory instead of printing them
    #[arg(short, long)]
    out_dir: Option<String>,

    #[arg(long)]
    server_name: Option<String>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    app_dir: Option<String>,

    #[arg(long)]
    workers: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

impl DeployArgs {
    fn deploy_config(&self) -> DeployConfig {
        let mut config = DeployConfig::default();
        if let Some(server_name) = &self.server_name {
            config.server_name = server_name.clone();
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(app_dir) = &self.app_dir {
            config.app_dir = app_dir.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config
    }
}

fn render(config: &DeployConfig, artifact: Artifact) -> Vec<(&'static str, String)> {
    use reddit_tracker::deploy::{DOCKERFILE_PATH, FIREWALL_PATH, NGINX_PATH, SUPERVISOR_PATH};

    match artifact {
        Artifact::Supervisor => vec![(SUPERVISOR_PATH, config.render_supervisor())],
        Artifact::Nginx => vec![(NGINX_PATH, config.render_nginx(config.host_port))],
        Artifact::NginxContainer => vec![(NGINX_PATH, config.render_nginx(config.container_port))],
        Artifact::Firewall => vec![(FIREWALL_PATH, config.render_firewall())],
        Artifact::Dockerfile => vec![(DOCKERFILE_PATH, config.render_dockerfile())],
        Artifact::All => config.render_all(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = DeployArgs::parse();
    logger::init_cli_logger(args.verbose);

    let config = args.deploy_config();
    config.validate()?;

    let artifacts = render(&config, args.artifact);
    match &args.out_dir {
        Some(dir) => {
            let storage = LocalStorage::new(dir);
            for (path, content) in artifacts {
                storage.write_file(path, content.as_bytes()).await?;
                println!("✅ Wrote {}", storage.resolve(path).display());
            }
        }
        None => {
            for (path, content) in artifacts {
                println!("# {}\n{}", path, content);
            }
        }
    }
    Ok(())
}
