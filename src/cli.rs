use chrono::{DateTime, Utc};
use env_loadr::{map_fields, EnvConfig, EnvMap, Loader, Reporter, TagValidator, TracingReporter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, EnvConfig)]
struct DemoConfig {
    #[env("APP_NAME", validate(required))]
    name: String,

    #[env("APP_PORT", validate(min = 1, max = 65535))]
    port: i32,

    #[env("APP_RATIO")]
    ratio: f64,

    #[env("APP_DEBUG")]
    debug: bool,

    #[env("APP_STARTED_AT")]
    started_at: DateTime<Utc>,

    #[env("APP_ENVIRONMENT", validate(one_of("dev", "prod")))]
    environment: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("load") => load(&args[1..]),
        Some("entries") => load_entries(&args[1..]),
        Some(arg) => println!("unknown arg: {}. Available: load, entries", arg),
        None => {
            println!("Usage: util-cli [command]");
            println!("Commands:");
            println!("  load [dir] [file]       - Load DemoConfig from <dir>/<file> or the environment");
            println!("  entries KEY=VALUE ...   - Load DemoConfig from the given entries only");
        }
    };
}

fn load(path: &[String]) {
    let mut config = DemoConfig {
        environment: "dev".to_string(),
        ..DemoConfig::default()
    };
    let source = Loader::new().path(path).load_or_exit(&mut config);
    println!("Config loaded from {}", source);
    print_config(&config);
}

fn load_entries(entries: &[String]) {
    let mut config = DemoConfig {
        environment: "dev".to_string(),
        ..DemoConfig::default()
    };
    let schema = DemoConfig::schema();

    let result = EnvMap::from_entries(entries)
        .and_then(|env| map_fields(&env, &mut config, &schema))
        .and_then(|assigned| {
            TagValidator::check(&schema, &config)?;
            Ok(assigned)
        });

    match result {
        Ok(assigned) => {
            println!("Assigned {} field(s) from entries", assigned);
            print_config(&config);
        }
        Err(e) => {
            TracingReporter.report(&e);
            std::process::exit(1);
        }
    }
}

fn print_config(config: &DemoConfig) {
    println!("  name: {}", config.name);
    println!("  port: {}", config.port);
    println!("  ratio: {}", config.ratio);
    println!("  debug: {}", config.debug);
    println!("  started_at: {}", config.started_at.to_rfc3339());
    println!("  environment: {}", config.environment);

    let schema = DemoConfig::schema();
    println!("Keys:");
    for spec in schema.fields() {
        if let Some(key) = spec.key {
            println!("  {} -> {} ({})", key, spec.name, spec.kind);
        }
    }
}
