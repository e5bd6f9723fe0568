//! Warehouse CLI - products, orders and customers over SQLite

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use warehouse_core::application::{CustomerInfo, CustomerService};
use warehouse_core::config::{Env, LOCAL_ENV_FILE, Settings};
use warehouse_core::domain::customers::Customer;
use warehouse_core::domain::unit_of_work::run_in_transaction;
use warehouse_core::domain::warehouse::{Order, Product, WarehouseService};
use warehouse_core::infrastructure::{
    Session, SqliteCustomerRepository, SqliteOrderRepository, SqliteProductRepository,
    SqliteUnitOfWork,
};
use warehouse_core::storage::{CURRENT_VERSION, Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "warehouse")]
#[command(author, version, about = "Warehouse, order and customer management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Database URL, overrides the configured one
    #[arg(long, global = true)]
    database: Option<String>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply migrations
    Init,

    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },

    /// Manage customers and their orders
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Add a product
    Add {
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
    },
    /// Show product details
    Show {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// List all products
    List,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Create an order over existing products
    Create {
        /// Product IDs, in order
        #[arg(required = true, allow_negative_numbers = true)]
        product_ids: Vec<i64>,
    },
    /// Show order details
    Show {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// List all orders
    List,
}

#[derive(Subcommand)]
enum CustomerAction {
    /// Register a customer
    Register {
        name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: NaiveDate,
    },
    /// Place a single-line order for a customer
    Order {
        #[arg(allow_negative_numbers = true)]
        customer_id: i64,
        /// Product name of the order line
        product: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: i64,
        #[arg(long, allow_negative_numbers = true)]
        price: f64,
        /// Request a specific order ID
        #[arg(long, allow_negative_numbers = true)]
        order_id: Option<i64>,
    },
    /// Show a customer with their orders
    Info {
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },
    /// List all customers
    List,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

/// Database, session and the services wired over it
struct App {
    db: Database,
    session: Session,
    warehouse: WarehouseService,
    customers: CustomerService,
}

impl App {
    async fn open(settings: &Settings) -> anyhow::Result<Self> {
        let db = Database::new(DatabaseConfig::from_settings(&settings.database)).await?;
        let session = Session::new(&db);

        let products = Arc::new(SqliteProductRepository::new(session.clone()));
        let orders = Arc::new(SqliteOrderRepository::new(session.clone()));
        let customers = Arc::new(SqliteCustomerRepository::new(session.clone()));

        Ok(Self {
            warehouse: WarehouseService::new(products.clone(), orders.clone()),
            customers: CustomerService::new(customers, orders, products),
            session,
            db,
        })
    }

    fn unit_of_work(&self) -> SqliteUnitOfWork {
        SqliteUnitOfWork::new(self.session.clone())
    }

    /// Release the session and close the pool
    async fn close(self) {
        // Read-only commands leave their implicit transaction open
        if let Err(e) = self.session.rollback().await {
            warn!("Failed to release session: {}", e);
        }
        self.db.close().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_local_env_file();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Read `.env.local` when running in the local environment
fn load_local_env_file() {
    if matches!(Env::selected(), Ok(Env::Local)) {
        dotenvy::from_filename(LOCAL_ENV_FILE).ok();
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warehouse=info"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<warehouse_core::Error>() {
        Some(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let quiet = cli.quiet;
    let database = cli.database.as_deref();

    match cli.command {
        Commands::Init => {
            let settings = load_settings(database)?;
            let app = App::open(&settings).await?;
            let result = cmd_init(&app, &settings, format, quiet).await;
            app.close().await;
            result
        }
        Commands::Products { action } => {
            let app = App::open(&load_settings(database)?).await?;
            let result = cmd_products(&app, action, format, quiet).await;
            app.close().await;
            result
        }
        Commands::Orders { action } => {
            let app = App::open(&load_settings(database)?).await?;
            let result = cmd_orders(&app, action, format, quiet).await;
            app.close().await;
            result
        }
        Commands::Customers { action } => {
            let app = App::open(&load_settings(database)?).await?;
            let result = cmd_customers(&app, action, format, quiet).await;
            app.close().await;
            result
        }
        Commands::Config { action } => cmd_config(action, quiet),
        Commands::Doctor => cmd_doctor(database, quiet).await,
    }
}

/// Configured settings with the `--database` override applied
fn load_settings(database: Option<&str>) -> anyhow::Result<Settings> {
    let mut settings = Settings::load()?;
    if let Some(url) = database {
        settings.set("database.url", url)?;
    }
    Ok(settings)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_init(
    app: &App,
    settings: &Settings,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    let status = app.db.migration_status().await?;

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "database": settings.database.url,
            "schema_version": status.current_version,
        }));
    }

    if !quiet {
        println!("Database ready: {}", settings.database.url);
        println!("  Schema version: {}", status.current_version);
    }
    Ok(())
}

async fn cmd_products(
    app: &App,
    action: ProductAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        ProductAction::Add {
            name,
            quantity,
            price,
        } => {
            let warehouse = &app.warehouse;
            let mut uow = app.unit_of_work();
            let product = run_in_transaction(&mut uow, || async {
                warehouse.create_product(&name, quantity, price).await
            })
            .await?;

            if format == OutputFormat::Json {
                return print_json(&product);
            }
            if quiet {
                println!("{}", product.id);
            } else {
                println!("Product created successfully!");
                print_product(&product);
            }
        }
        ProductAction::Show { id } => {
            let product = app.warehouse.get_product(id).await?;
            if format == OutputFormat::Json {
                return print_json(&product);
            }
            println!("Product: {}", product.name);
            print_product(&product);
        }
        ProductAction::List => {
            let products = app.warehouse.list_products().await?;
            if format == OutputFormat::Json {
                return print_json(&products);
            }
            if products.is_empty() {
                if !quiet {
                    println!("No products found.");
                    println!("\nAdd one with: warehouse products add <name> --quantity <n> --price <p>");
                }
            } else {
                if !quiet {
                    println!("Products:");
                }
                for p in products {
                    println!(
                        "  {} - {} (qty {}, price {:.2})",
                        p.id, p.name, p.quantity, p.price
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_product(product: &Product) {
    println!("  ID: {}", product.id);
    println!("  Name: {}", product.name);
    println!("  Quantity: {}", product.quantity);
    println!("  Price: {:.2}", product.price);
}

async fn cmd_orders(
    app: &App,
    action: OrderAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        OrderAction::Create { product_ids } => {
            let warehouse = &app.warehouse;
            let mut uow = app.unit_of_work();
            let order = run_in_transaction(&mut uow, || async {
                let mut products = Vec::with_capacity(product_ids.len());
                for &id in &product_ids {
                    products.push(warehouse.get_product(id).await?);
                }
                warehouse.create_order(products).await
            })
            .await?;

            if format == OutputFormat::Json {
                return print_json(&order);
            }
            if quiet {
                println!("{}", order.id);
            } else {
                println!("Order created successfully!");
                print_order(&order);
            }
        }
        OrderAction::Show { id } => {
            let order = app.warehouse.get_order(id).await?;
            if format == OutputFormat::Json {
                return print_json(&order);
            }
            println!("Order {}", order.id);
            print_order(&order);
        }
        OrderAction::List => {
            let orders = app.warehouse.list_orders().await?;
            if format == OutputFormat::Json {
                return print_json(&orders);
            }
            if orders.is_empty() {
                if !quiet {
                    println!("No orders found.");
                    println!("\nCreate one with: warehouse orders create <product-id>...");
                }
            } else {
                if !quiet {
                    println!("Orders:");
                }
                for o in orders {
                    let customer = o
                        .customer_id
                        .map(|id| format!(", customer {}", id))
                        .unwrap_or_default();
                    println!(
                        "  {} - {} product(s), total {:.2}{}",
                        o.id,
                        o.products.len(),
                        o.total_price(),
                        customer
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_order(order: &Order) {
    println!("  ID: {}", order.id);
    if let Some(customer_id) = order.customer_id {
        println!("  Customer: {}", customer_id);
    }
    println!("  Products:");
    for p in &order.products {
        println!(
            "    {} - {} x{} @ {:.2}",
            p.id, p.name, p.quantity, p.price
        );
    }
    println!("  Total: {:.2}", order.total_price());
}

async fn cmd_customers(
    app: &App,
    action: CustomerAction,
    format: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match action {
        CustomerAction::Register { name, birth_date } => {
            let customers = &app.customers;
            let mut uow = app.unit_of_work();
            let customer = run_in_transaction(&mut uow, || async {
                customers.register_customer(&name, birth_date).await
            })
            .await?;

            if format == OutputFormat::Json {
                return print_json(&customer);
            }
            if quiet {
                println!("{}", customer.id);
            } else {
                println!("Customer registered successfully!");
                print_customer(&customer);
            }
        }
        CustomerAction::Order {
            customer_id,
            product,
            quantity,
            price,
            order_id,
        } => {
            let customers = &app.customers;
            let mut uow = app.unit_of_work();
            let order = run_in_transaction(&mut uow, || async {
                customers
                    .create_order_for_customer(customer_id, order_id, &product, quantity, price)
                    .await
            })
            .await?;

            if format == OutputFormat::Json {
                return print_json(&order);
            }
            if quiet {
                println!("{}", order.id);
            } else {
                println!("Order created successfully!");
                print_order(&order);
            }
        }
        CustomerAction::Info { id } => {
            let info = app.customers.get_customer_info(id).await?;
            if format == OutputFormat::Json {
                return print_json(&info);
            }
            print_customer_info(&info);
        }
        CustomerAction::List => {
            let customers = app.customers.list_customers().await?;
            if format == OutputFormat::Json {
                return print_json(&customers);
            }
            if customers.is_empty() {
                if !quiet {
                    println!("No customers found.");
                    println!("\nRegister one with: warehouse customers register <name> --birth-date YYYY-MM-DD");
                }
            } else {
                if !quiet {
                    println!("Customers:");
                }
                for c in customers {
                    println!(
                        "  {} - {} (born {}, {} order(s))",
                        c.id,
                        c.name,
                        c.birth_date,
                        c.orders.len()
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_customer(customer: &Customer) {
    println!("  ID: {}", customer.id);
    println!("  Name: {}", customer.name);
    println!("  Birth date: {}", customer.birth_date);
    println!("  Age: {}", customer.age());
}

fn print_customer_info(info: &CustomerInfo) {
    println!("Customer: {}", info.name);
    println!("  ID: {}", info.id);
    println!("  Age: {}", info.age);
    if info.orders.is_empty() {
        println!("  Orders: none");
        return;
    }
    println!("  Orders:");
    for order in &info.orders {
        println!("    Order {} (total {:.2})", order.id, order.total_price);
        for item in &order.items {
            println!(
                "      {} x{} @ {:.2} = {:.2}",
                item.product, item.quantity, item.price, item.total_price
            );
        }
    }
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let settings = Settings::load()?;
            let value = settings.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let path = Settings::config_path()?;
            let mut settings = Settings::load_file(&path)?;
            settings.set(&key, &value)?;
            settings.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let settings = Settings::load()?;
            for (key, value) in settings.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Settings::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(database: Option<&str>, quiet: bool) -> anyhow::Result<()> {
    if !quiet {
        println!("Warehouse Health Check");
        println!("======================");
        println!();
    }

    let mut all_ok = true;

    let settings = match load_settings(database) {
        Ok(settings) => {
            if !quiet {
                println!("[OK] Configuration: Valid (env: {})", settings.env);
            }
            Some(settings)
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {:#}", e);
            }
            None
        }
    };

    if !quiet {
        match Settings::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    if let Some(settings) = settings {
        let config = DatabaseConfig::from_settings(&settings.database).no_migrate();
        match Database::new(config).await {
            Ok(db) => {
                match db.health_check().await {
                    Ok(()) => {
                        if !quiet {
                            println!("[OK] Database: {}", settings.database.url);
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Database: Error - {:#}", e);
                        }
                    }
                }

                match db.migration_status().await {
                    Ok(status) if !status.needs_migration => {
                        if !quiet {
                            println!("[OK] Schema: version {}", status.current_version);
                        }
                    }
                    Ok(status) => {
                        all_ok = false;
                        if !quiet {
                            println!(
                                "[!!] Schema: version {} of {}",
                                status.current_version, CURRENT_VERSION
                            );
                            println!("     Run `warehouse init` to apply migrations");
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Schema: Error - {:#}", e);
                        }
                    }
                }
                db.close().await;
            }
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Error - {:#}", e);
                }
            }
        }
    }

    if !quiet {
        println!();
    }
    if all_ok {
        if !quiet {
            println!("All checks passed.");
        }
        Ok(())
    } else {
        Err(anyhow!("Some checks failed"))
    }
}
