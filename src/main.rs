//! MBean Console
//!
//! Registers a demo connection pool on the platform server and serves
//! management commands from stdin.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_mbean::{
    descriptor_schema, platform_server, ConfigManager, Impact, MBeanBuilder, MBeanServer, Manageable,
    ManagedAttribute, ManagedOperation, Management, ObjectName,
};

const DEMO_NAME: &str = "demo:type=ConnectionPool,name=primary";

// ──────────────────────────────────────────────────────────────────────────────
// DEMO OBJECT
// ──────────────────────────────────────────────────────────────────────────────

struct ConnectionPool {
    active: AtomicU32,
    max_size: AtomicU32,
    healthy: AtomicBool,
}

impl ConnectionPool {
    fn new(max_size: u32) -> Self {
        Self {
            active: AtomicU32::new(0),
            max_size: AtomicU32::new(max_size),
            healthy: AtomicBool::new(true),
        }
    }

    fn get_active(&self) -> u32 {
        self.active.load(Ordering::SeqCst)
    }

    fn get_max_size(&self) -> u32 {
        self.max_size.load(Ordering::SeqCst)
    }

    fn set_max_size(&self, max_size: u32) {
        self.max_size.store(max_size, Ordering::SeqCst);
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn acquire(&self, count: u32) -> Result<u32, String> {
        let max = self.get_max_size();
        let active = self.get_active();
        if active + count > max {
            return Err(format!("pool exhausted: {} active, {} requested, max {}", active, count, max));
        }
        Ok(self.active.fetch_add(count, Ordering::SeqCst) + count)
    }

    fn drain(&self) -> u32 {
        self.active.swap(0, Ordering::SeqCst)
    }

    fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

impl Manageable for ConnectionPool {
    fn management(builder: MBeanBuilder<Self>) -> MBeanBuilder<Self> {
        builder
            .description("Database connection pool")
            .attribute("getActive", ConnectionPool::get_active, ManagedAttribute::new().description("Connections in use"))
            .attribute("getMaxSize", ConnectionPool::get_max_size, ManagedAttribute::new().description("Upper bound on connections"))
            .plain("setMaxSize", ConnectionPool::set_max_size)
            .attribute("isHealthy", ConnectionPool::is_healthy, ManagedAttribute::new())
            .plain("setHealthy", ConnectionPool::set_healthy)
            .operation(
                "acquire",
                ConnectionPool::acquire,
                ManagedOperation::new().description("Check out connections").impact(Impact::ActionInfo),
            )
            .operation(
                "drain",
                ConnectionPool::drain,
                ManagedOperation::new().description("Release every connection").impact(Impact::Action),
            )
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// COMMANDS
// ──────────────────────────────────────────────────────────────────────────────

/// Split off at most `max` whitespace-separated words; the last keeps the rest of the line
fn split_args(line: &str, max: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        if parts.len() + 1 == max {
            parts.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(i) => {
                parts.push(&rest[..i]);
                rest = rest[i..].trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}

fn object_name(raw: Option<&&str>) -> Result<ObjectName> {
    let raw = raw.ok_or_else(|| anyhow!("missing object name"))?;
    Ok(raw.parse::<ObjectName>()?)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one console command. Returns `false` when the console should exit.
fn run_command(server: &MBeanServer, management: &Management, line: &str) -> Result<bool> {
    let args = split_args(line, 4);
    let Some(command) = args.first() else {
        return Ok(true);
    };

    match command.to_lowercase().as_str() {
        "quit" | "exit" | "q" => return Ok(false),
        "list" => {
            let pattern = args.get(1).map(|p| p.parse::<ObjectName>()).transpose()?;
            let names = server.query_names(pattern.as_ref());
            println!("📋 {} MBean(s):", names.len());
            for name in names {
                println!("   • {}", name);
            }
        }
        "describe" => {
            let name = object_name(args.get(1))?;
            print_json(&server.describe(&name)?.to_json())?;
        }
        "get" => {
            let name = object_name(args.get(1))?;
            let attribute = args.get(2).ok_or_else(|| anyhow!("usage: get <name> <attr>"))?;
            print_json(&server.get_attribute(&name, attribute)?)?;
        }
        "set" => {
            let name = object_name(args.get(1))?;
            let (attribute, raw) = match (args.get(2), args.get(3)) {
                (Some(attribute), Some(raw)) => (attribute, raw),
                _ => bail!("usage: set <name> <attr> <json>"),
            };
            let value: Value = serde_json::from_str(raw).with_context(|| format!("invalid JSON value: {}", raw))?;
            server.set_attribute(&name, attribute, value)?;
            println!("✅ {} updated", attribute);
        }
        "invoke" => {
            let name = object_name(args.get(1))?;
            let operation = args.get(2).ok_or_else(|| anyhow!("usage: invoke <name> <op> [json-array]"))?;
            let params = match args.get(3) {
                Some(raw) => serde_json::from_str::<Vec<Value>>(raw)
                    .with_context(|| format!("arguments must be a JSON array: {}", raw))?,
                None => Vec::new(),
            };
            print_json(&server.invoke(&name, operation, params)?)?;
        }
        "unregister" => {
            let name = args.get(1).ok_or_else(|| anyhow!("usage: unregister <name>"))?;
            management.unregister(name)?;
            println!("🗑️  {} unregistered", name);
        }
        "schema" => print_json(&descriptor_schema())?,
        "help" => print_help(),
        other => bail!("unknown command '{}', try 'help'", other),
    }
    Ok(true)
}

fn print_help() {
    println!("💡 Commands:");
    println!("   list [pattern]");
    println!("   describe <name>");
    println!("   get <name> <attr>");
    println!("   set <name> <attr> <json>");
    println!("   invoke <name> <op> [json-array]");
    println!("   unregister <name>");
    println!("   schema | help | quit");
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rust_mbean=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let config_path = std::env::var("MBEAN_CONFIG").unwrap_or_else(|_| "mbean.json".to_string());
    let mut config = ConfigManager::new(&config_path)
        .load()
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    config.apply_overrides(|key| std::env::var(key).ok());

    println!("\n{}", "═".repeat(60));
    println!("🛠️  MBean Console v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", "═".repeat(60));

    let server = platform_server();
    let management = Management::platform().with_config(config);

    let pool = Arc::new(ConnectionPool::new(16));
    let registered = management.register(pool, DEMO_NAME)?;
    info!(object_name = %registered, "Demo pool ready");
    println!("📦 Registered {}", registered);
    println!("🌐 Default domain: {}\n", server.default_domain());
    print_help();
    println!();

    loop {
        print!("🔧 mbean> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        match run_command(&server, &management, line) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("❌ Error: {:#}", e),
        }
    }

    println!("\n👋 Goodbye!\n");
    Ok(())
}
