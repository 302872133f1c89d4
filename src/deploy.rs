use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_range, Validate};

pub const SUPERVISOR_PATH: &str = "deploy/supervisor/reddit-tracker.conf";
pub const NGINX_PATH: &str = "deploy/nginx/reddit-tracker";
pub const FIREWALL_PATH: &str = "deploy/firewall.sh";
pub const DOCKERFILE_PATH: &str = "Dockerfile";

/// Values substituted into the supervisor, nginx, firewall and container files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub app_name: String,
    pub app_dir: String,
    pub user: String,
    pub log_dir: String,
    pub server_name: String,
    /// Port the server listens on behind nginx on a plain host.
    pub host_port: u16,
    /// Port the server listens on inside the container.
    pub container_port: u16,
    pub workers: usize,
    pub timeout_secs: u64,
    pub base_image: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            app_name: "reddit-tracker".to_string(),
            app_dir: "/home/tracker/reddit-tracker".to_string(),
            user: "tracker".to_string(),
            log_dir: "/var/log/reddit-tracker".to_string(),
            server_name: "your_domain_or_ip".to_string(),
            host_port: 8000,
            container_port: 8080,
            workers: 4,
            timeout_secs: 300,
            base_image: "rust:1.82-slim".to_string(),
        }
    }
}

impl DeployConfig {
    fn server_args(&self, bind: &str) -> String {
        format!(
            "--bind {} --workers {} --timeout {}",
            bind, self.workers, self.timeout_secs
        )
    }

    pub fn render_supervisor(&self) -> String {
        format!(
            "[program:{name}]\n\
             directory={dir}\n\
             command={dir}/target/release/server {args}\n\
             autostart=true\n\
             autorestart=true\n\
             user={user}\n\
             environment=APP_NAME=\"{name}\",APP_ENV=\"production\"\n\
             stderr_logfile={logs}/{name}.err.log\n\
             stdout_logfile={logs}/{name}.out.log\n",
            name = self.app_name,
            dir = self.app_dir,
            args = self.server_args(&format!("127.0.0.1:{}", self.host_port)),
            user = self.user,
            logs = self.log_dir,
        )
    }

    /// Reverse proxy block forwarding to `upstream_port` on localhost.
    pub fn render_nginx(&self, upstream_port: u16) -> String {
        format!(
            "server {{\n\
             \x20   listen 80;\n\
             \x20   server_name {server_name};\n\
             \n\
             \x20   location / {{\n\
             \x20       proxy_pass http://127.0.0.1:{port};\n\
             \x20       proxy_set_header Host $host;\n\
             \x20       proxy_set_header X-Real-IP $remote_addr;\n\
             \x20       proxy_connect_timeout {timeout}s;\n\
             \x20       proxy_read_timeout {timeout}s;\n\
             \x20   }}\n\
             }}\n",
            server_name = self.server_name,
            port = upstream_port,
            timeout = self.timeout_secs,
        )
    }

    pub fn render_firewall(&self) -> String {
        "#!/bin/sh\n\
         set -e\n\
         \n\
         ufw allow OpenSSH\n\
         ufw allow 'Nginx Full'\n\
         ufw --force enable\n\
         ufw status\n"
            .to_string()
    }

    pub fn render_dockerfile(&self) -> String {
        format!(
            "FROM {image}\n\
             \n\
             RUN apt-get update \\\n\
             \x20   && apt-get install -y --no-install-recommends ca-certificates \\\n\
             \x20   && rm -rf /var/lib/apt/lists/*\n\
             \n\
             WORKDIR /app\n\
             COPY . .\n\
             RUN cargo build --release --bin server\n\
             \n\
             ENV APP_NAME={name}\n\
             ENV APP_ENV=production\n\
             ENV PORT={port}\n\
             \n\
             EXPOSE {port}\n\
             \n\
             CMD [\"sh\", \"-c\", \"./target/release/server {args}\"]\n",
            image = self.base_image,
            name = self.app_name,
            port = self.container_port,
            args = self.server_args("0.0.0.0:${PORT}"),
        )
    }

    /// Every artifact paired with its path relative to the repository root.
    pub fn render_all(&self) -> Vec<(&'static str, String)> {
        vec![
            (SUPERVISOR_PATH, self.render_supervisor()),
            (NGINX_PATH, self.render_nginx(self.host_port)),
            (FIREWALL_PATH, self.render_firewall()),
            (DOCKERFILE_PATH, self.render_dockerfile()),
        ]
    }
}

impl Validate for DeployConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("app_name", &self.app_name)?;
        validate_non_empty_string("user", &self.user)?;
        validate_non_empty_string("server_name", &self.server_name)?;
        validate_path("app_dir", &self.app_dir)?;
        validate_path("log_dir", &self.log_dir)?;
        validate_range("host_port", self.host_port, 1, u16::MAX)?;
        validate_range("container_port", self.container_port, 1, u16::MAX)?;
        validate_range("workers", self.workers, 1, 64)?;
        validate_range("timeout_secs", self.timeout_secs, 1, 3600)?;
        Ok(())
    }
}
