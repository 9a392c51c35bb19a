use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::debug;

use rgw_core::provider::Provider;
use rgw_core::resource::{Resource, ResourceId, State, Value};
use rgw_provider::resources::{QUOTA, USER, schema_for};
use rgw_provider::{ProviderConfig, ProviderSettings, RgwProvider};

#[derive(Parser)]
#[command(name = "rgw")]
#[command(about = "Manage Ceph Object Gateway users and quotas", long_about = None)]
struct Cli {
    /// Gateway URL [env: RGW_ENDPOINT]
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Admin access key [env: RGW_ACCESS_KEY]
    #[arg(long, global = true)]
    access_key: Option<String>,

    /// Admin secret key [env: RGW_SECRET_KEY]
    #[arg(long, global = true)]
    secret_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Print keys and secrets instead of masking them
    #[arg(long, global = true)]
    show_sensitive: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage user and bucket quotas
    Quota {
        #[command(subcommand)]
        command: QuotaCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Create {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        tenant: Option<String>,

        #[command(flatten)]
        fields: UserFields,
    },
    /// Show a user by identity (`user_id` or `tenant$user_id`)
    Read { identity: String },
    /// Modify a user in place
    Update {
        identity: String,

        #[command(flatten)]
        fields: UserFields,
    },
    /// Remove a user
    Delete {
        identity: String,

        /// Also remove the user's buckets and objects
        #[arg(long)]
        purge_data: Option<i64>,
    },
    /// Look up a user without managing it
    Lookup {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        tenant: Option<String>,
    },
}

#[derive(Args, Default)]
struct UserFields {
    #[arg(long)]
    display_name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    suspended: Option<i64>,

    #[arg(long)]
    max_buckets: Option<i64>,

    #[arg(long)]
    generate_key: Option<bool>,

    #[arg(long, value_parser = ["s3", "swift"])]
    key_type: Option<String>,

    /// Capabilities to grant, e.g. "usage=read, write; users=read"
    #[arg(long)]
    user_caps: Option<String>,
}

#[derive(Subcommand)]
enum QuotaCommands {
    /// Set the quota of a user
    Set {
        #[arg(long)]
        user_id: String,

        /// Quota type
        #[arg(long = "type", value_parser = ["user", "bucket"])]
        quota_type: String,

        #[arg(long)]
        enabled: Option<bool>,

        #[arg(long)]
        check_on_raw: Option<bool>,

        #[arg(long)]
        max_size: Option<i64>,

        #[arg(long)]
        max_size_kb: Option<i64>,

        #[arg(long)]
        max_objects: Option<i64>,
    },
    /// Show a quota by identity (`<type>_<user_id>`)
    Read { identity: String },
    /// Disable a quota
    Disable { identity: String },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let provider = get_provider(&cli)?;
    let show_sensitive = cli.show_sensitive;

    let state = match cli.command {
        Commands::User { command } => run_user_command(&provider, command).await?,
        Commands::Quota { command } => run_quota_command(&provider, command).await?,
    };

    if let Some(state) = state {
        print_state(&state, show_sensitive)?;
    }
    Ok(())
}

fn get_provider(cli: &Cli) -> Result<RgwProvider, String> {
    let settings = ProviderSettings {
        endpoint: cli.endpoint.clone(),
        access_key: cli.access_key.clone(),
        secret_key: cli.secret_key.clone(),
        timeout_secs: cli.timeout,
    };
    let config = ProviderConfig::resolve(settings).map_err(|e| e.to_string())?;
    debug!(
        "Using endpoint {} with a {:?} timeout",
        config.endpoint(),
        config.timeout()
    );
    RgwProvider::new(&config).map_err(|e| e.to_string())
}

async fn run_user_command(
    provider: &RgwProvider,
    command: UserCommands,
) -> Result<Option<State>, String> {
    match command {
        UserCommands::Create {
            user_id,
            tenant,
            fields,
        } => {
            let resource = user_resource(&user_id, tenant.as_deref(), fields);
            let state = provider.create(&resource).await.map_err(|e| e.to_string())?;
            eprintln!("{} {}", "✓ Created".green(), identity_of(&state));
            Ok(Some(state))
        }
        UserCommands::Read { identity } => {
            let state = import(provider, USER, &identity).await?;
            Ok(Some(state))
        }
        UserCommands::Update { identity, fields } => {
            let current = import(provider, USER, &identity).await?;
            let user_id = current
                .attributes
                .get("user_id")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let tenant = current.attributes.get("tenant").and_then(Value::as_str);
            let resource = user_resource(user_id, tenant, fields);

            let state = provider
                .update(&current, &resource)
                .await
                .map_err(|e| e.to_string())?;
            eprintln!("{} {}", "✓ Updated".green(), identity_of(&state));
            Ok(Some(state))
        }
        UserCommands::Delete {
            identity,
            purge_data,
        } => {
            let mut current = import(provider, USER, &identity).await?;
            if let Some(purge_data) = purge_data {
                current
                    .attributes
                    .insert("purge_data".to_string(), Value::Int(purge_data));
            }
            provider.delete(&current).await.map_err(|e| e.to_string())?;
            eprintln!("{} {}", "✓ Removed".green(), identity);
            Ok(None)
        }
        UserCommands::Lookup { user_id, tenant } => {
            let mut resource = Resource::new(USER, &user_id)
                .with_attribute("user_id", user_id.as_str())
                .with_read_only(true);
            if let Some(tenant) = tenant {
                resource = resource.with_attribute("tenant", tenant);
            }
            let state = provider
                .read_data_source(&resource)
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(state))
        }
    }
}

async fn run_quota_command(
    provider: &RgwProvider,
    command: QuotaCommands,
) -> Result<Option<State>, String> {
    match command {
        QuotaCommands::Set {
            user_id,
            quota_type,
            enabled,
            check_on_raw,
            max_size,
            max_size_kb,
            max_objects,
        } => {
            let name = format!("{}_{}", quota_type, user_id);
            let mut resource = Resource::new(QUOTA, name)
                .with_attribute("user_id", user_id)
                .with_attribute("type", quota_type);
            for (key, value) in [("enabled", enabled), ("check_on_raw", check_on_raw)] {
                if let Some(value) = value {
                    resource = resource.with_attribute(key, value);
                }
            }
            for (key, value) in [
                ("max_size", max_size),
                ("max_size_kb", max_size_kb),
                ("max_objects", max_objects),
            ] {
                if let Some(value) = value {
                    resource = resource.with_attribute(key, value);
                }
            }

            let state = provider.create(&resource).await.map_err(|e| e.to_string())?;
            eprintln!("{} {}", "✓ Set".green(), identity_of(&state));
            Ok(Some(state))
        }
        QuotaCommands::Read { identity } => Ok(Some(import(provider, QUOTA, &identity).await?)),
        QuotaCommands::Disable { identity } => {
            let current = import(provider, QUOTA, &identity).await?;
            provider.delete(&current).await.map_err(|e| e.to_string())?;
            eprintln!("{} {}", "✓ Disabled".green(), identity);
            Ok(None)
        }
    }
}

async fn import(
    provider: &RgwProvider,
    resource_type: &str,
    identity: &str,
) -> Result<State, String> {
    provider
        .import(&ResourceId::new(resource_type, identity), identity)
        .await
        .map_err(|e| e.to_string())
}

fn user_resource(user_id: &str, tenant: Option<&str>, fields: UserFields) -> Resource {
    let mut resource = Resource::new(USER, user_id).with_attribute("user_id", user_id);
    if let Some(tenant) = tenant {
        resource = resource.with_attribute("tenant", tenant);
    }

    let strings = [
        ("display_name", fields.display_name),
        ("email", fields.email),
        ("key_type", fields.key_type),
        ("user_caps", fields.user_caps),
    ];
    for (key, value) in strings {
        if let Some(value) = value {
            resource = resource.with_attribute(key, value);
        }
    }
    for (key, value) in [
        ("suspended", fields.suspended),
        ("max_buckets", fields.max_buckets),
    ] {
        if let Some(value) = value {
            resource = resource.with_attribute(key, value);
        }
    }
    if let Some(generate_key) = fields.generate_key {
        resource = resource.with_attribute("generate_key", generate_key);
    }
    resource
}

fn identity_of(state: &State) -> &str {
    state.identifier.as_deref().unwrap_or(&state.id.name)
}

fn print_state(state: &State, show_sensitive: bool) -> Result<(), String> {
    let mut printable = state.clone();
    if !show_sensitive && let Some(schema) = schema_for(&state.id.resource_type) {
        printable.attributes = schema.redacted(&state.attributes);
    }
    let json = serde_json::to_string_pretty(&printable.to_json())
        .map_err(|e| format!("Failed to render state: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rgw",
            "user",
            "read",
            "t1$alice",
            "--endpoint",
            "http://rgw:8080",
            "--show-sensitive",
        ])
        .unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("http://rgw:8080"));
        assert!(cli.show_sensitive);
        assert!(matches!(
            cli.command,
            Commands::User {
                command: UserCommands::Read { ref identity }
            } if identity == "t1$alice"
        ));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["rgw", "--timeout", "0", "user", "read", "alice"]).is_err());
        let cli =
            Cli::try_parse_from(["rgw", "--timeout", "5", "user", "read", "alice"]).unwrap();
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn rejects_unknown_quota_type() {
        let result = Cli::try_parse_from([
            "rgw", "quota", "set", "--user-id", "alice", "--type", "object",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn user_resource_only_carries_given_fields() {
        let fields = UserFields {
            max_buckets: Some(0),
            generate_key: Some(false),
            ..Default::default()
        };
        let resource = user_resource("alice", Some("t1"), fields);
        assert_eq!(resource.id, ResourceId::new("user", "alice"));
        assert_eq!(resource.attributes.get("max_buckets"), Some(&Value::Int(0)));
        assert_eq!(
            resource.attributes.get("generate_key"),
            Some(&Value::Bool(false))
        );
        assert_eq!(resource.attributes.get("tenant"), Some(&Value::from("t1")));
        assert!(!resource.attributes.contains_key("email"));
    }

    #[test]
    fn sensitive_values_are_masked() {
        let key = Value::Map(
            [
                ("access_key".to_string(), Value::from("AK")),
                ("secret_key".to_string(), Value::from("SK")),
            ]
            .into_iter()
            .collect(),
        );
        let state = State::existing(
            ResourceId::new("user", "alice"),
            [("keys".to_string(), Value::List(vec![key]))]
                .into_iter()
                .collect(),
        );
        let schema = schema_for("user").unwrap();
        let redacted = schema.redacted(&state.attributes);
        assert!(!format!("{:?}", redacted).contains("SK"));
    }
}
