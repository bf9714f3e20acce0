use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use stockroom::api::types::{NewOrder, NewProduct, Order, Product};
use stockroom::api::Inventory;
use stockroom::app::App;
use stockroom::commands::{parse_price, Action, EntityKind};
use stockroom::config::Config;
use stockroom::event::EventHandler;
use stockroom::logging;
use stockroom::notify::NotificationStore;

#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(about = "A command-line client for a small inventory backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/stockroom/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Backend base URL, overriding config and STOCKROOM_API_URL
  #[arg(long)]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Manage products
  Products {
    #[command(subcommand)]
    command: ProductCommand,
  },
  /// Manage orders
  Orders {
    #[command(subcommand)]
    command: OrderCommand,
  },
  /// List companies
  Companies,
  /// Start the interactive shell (default)
  Shell,
}

#[derive(Subcommand, Debug)]
enum ProductCommand {
  List,
  Get {
    id: u64,
  },
  Create {
    name: String,
    #[arg(value_parser = parse_price)]
    price: f64,
  },
  Update {
    id: u64,
    name: String,
    #[arg(value_parser = parse_price)]
    price: f64,
  },
  Delete {
    id: u64,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },
}

#[derive(Subcommand, Debug)]
enum OrderCommand {
  List,
  Get {
    id: u64,
  },
  Create {
    #[command(flatten)]
    fields: OrderFields,
  },
  Update {
    id: u64,
    #[command(flatten)]
    fields: OrderFields,
  },
  Delete {
    id: u64,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
  },
}

#[derive(clap::Args, Debug)]
struct OrderFields {
  /// Customer company id
  #[arg(long)]
  customer: u64,
  /// Supplier company id
  #[arg(long)]
  supplier: u64,
  /// Product ids, comma separated
  #[arg(long, value_delimiter = ',')]
  products: Vec<u64>,
}

/// A one-shot command resolved to what the shell would do
enum Job {
  Run(Action),
  Delete { kind: EntityKind, id: u64, yes: bool },
}

impl From<ProductCommand> for Job {
  fn from(command: ProductCommand) -> Self {
    match command {
      ProductCommand::List => Job::Run(Action::List(EntityKind::Products)),
      ProductCommand::Get { id } => Job::Run(Action::Show(EntityKind::Products, id)),
      ProductCommand::Create { name, price } => {
        Job::Run(Action::CreateProduct(NewProduct { name, price }))
      }
      ProductCommand::Update { id, name, price } => {
        Job::Run(Action::UpdateProduct(Product { id, name, price }))
      }
      ProductCommand::Delete { id, yes } => Job::Delete {
        kind: EntityKind::Products,
        id,
        yes,
      },
    }
  }
}

impl From<OrderCommand> for Job {
  fn from(command: OrderCommand) -> Self {
    match command {
      OrderCommand::List => Job::Run(Action::List(EntityKind::Orders)),
      OrderCommand::Get { id } => Job::Run(Action::Show(EntityKind::Orders, id)),
      OrderCommand::Create { fields } => Job::Run(Action::CreateOrder(NewOrder {
        customer_id: fields.customer,
        supplier_id: fields.supplier,
        products: fields.products,
      })),
      OrderCommand::Update { id, fields } => Job::Run(Action::UpdateOrder(Order {
        id,
        customer_id: fields.customer,
        supplier_id: fields.supplier,
        products: fields.products,
      })),
      OrderCommand::Delete { id, yes } => Job::Delete {
        kind: EntityKind::Orders,
        id,
        yes,
      },
    }
  }
}

/// Ask a yes/no question on the terminal; anything but y/yes is a no.
fn ask(prompt: &str) -> bool {
  print!("{} [y/N] ", prompt);
  if io::stdout().flush().is_err() {
    return false;
  }
  let mut answer = String::new();
  if io::stdin().lock().read_line(&mut answer).is_err() {
    return false;
  }
  matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration; --api-url beats STOCKROOM_API_URL beats the file
  let config = Config::load(args.config.as_deref())?.with_api_url(args.api_url);

  let _guard = logging::init(&config.log)?;

  let inventory = Inventory::connect(&config)?;
  let notifications = NotificationStore::new(config.notifications.timeout());
  let mut app = App::new(inventory, notifications.clone(), io::stdout());

  let job = match args.command.unwrap_or(Commands::Shell) {
    Commands::Shell => {
      let events = EventHandler::new(tokio::io::stdin(), notifications.subscribe());
      return app.run(events).await;
    }
    Commands::Products { command } => Job::from(command),
    Commands::Orders { command } => Job::from(command),
    Commands::Companies => Job::Run(Action::List(EntityKind::Companies)),
  };

  match job {
    Job::Run(action) => {
      app.execute(action).await?;
      app.flush_notifications()?;
    }
    Job::Delete { kind, id, yes } => {
      app.delete_id(kind, id, |prompt| yes || ask(prompt)).await?;
    }
  }

  Ok(())
}
