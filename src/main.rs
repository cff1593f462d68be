use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

use recaster::{
  BridgeClient, BridgeConfig, Error, Field, Forwarder, HeaderBlock, MutationSpec, Order,
  QueryCriteria, RepeaterSend, Result, SearchScope, SendResult, Tool, TrafficItem,
};

mod cli;
use cli::{Cli, Commands};

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();
  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("Error: {}", err);
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let bridge = BridgeClient::with_config(BridgeConfig {
    endpoint: cli.endpoint,
    timeout: Duration::from_secs(cli.timeout),
  })?;
  match cli.command {
    Commands::Health => {
      println!("{}", serde_json::to_string_pretty(&bridge.health()?)?);
    }
    Commands::Hosts => {
      for host in bridge.hosts()? {
        println!("{}", host);
      }
    }
    Commands::Docs => {
      println!("{}", bridge.docs()?);
    }
    Commands::Latest { max_body } => {
      print_item(&bridge.repeater_latest(max_body)?);
    }
    Commands::History {
      host,
      method,
      status,
      search,
      search_in,
      tool,
      ext_exclude,
      mime,
      order,
      limit,
      offset,
      fields,
      max_body,
      agent_only,
    } => {
      let has_fields = fields.is_some();
      let criteria = QueryCriteria {
        host,
        method,
        status,
        search,
        search_in: parse_csv::<SearchScope>(search_in.as_deref())?,
        tool: tool.as_deref().map(parse_one::<Tool>).transpose()?,
        ext_exclude: split_csv(ext_exclude.as_deref()),
        mime,
        order: match order.as_deref() {
          Some("asc") => Order::Asc,
          _ => Order::Desc,
        },
        limit: Some(limit),
        offset,
        fields: parse_csv::<Field>(fields.as_deref())?,
        max_body,
        agent_only,
      };
      let items = bridge.history(&criteria)?;
      if has_fields {
        println!("{}", serde_json::to_string_pretty(&items)?);
      } else {
        print_listing(&items);
        println!("\n{} result(s)", items.len());
      }
    }
    Commands::Get { id, max_body } => {
      print_item(&bridge.item(id, max_body)?);
    }
    Commands::Repeater { id, tab } => {
      let ack = bridge.send_to_repeater(RepeaterSend {
        history_id: Some(id),
        tab_name: tab,
        ..RepeaterSend::default()
      })?;
      println!("{}", serde_json::to_string_pretty(&ack)?);
    }
    Commands::Repeat {
      id,
      replace,
      header,
      body,
      proxy_port,
      max_body,
    } => {
      let spec = MutationSpec {
        replacements: pairs(replace),
        headers: pairs(header),
        body,
      };
      let forwarder = forwarder(proxy_port, cli.timeout, max_body)?;
      let result = bridge.repeat(id, &spec, &forwarder)?;
      print_send_result(&result);
    }
    Commands::Send {
      method,
      url,
      header,
      body,
      proxy_port,
      max_body,
    } => {
      let headers: HeaderBlock = pairs(header).into_iter().collect();
      let forwarder = forwarder(proxy_port, cli.timeout, max_body)?;
      let result = forwarder.send(&method, &url, headers, body)?;
      print_send_result(&result);
    }
    Commands::Scope { url } => {
      println!("{}", serde_json::to_string_pretty(&bridge.scope(&url)?)?);
    }
  }
  Ok(())
}

fn forwarder(proxy_port: u16, timeout: u64, max_body: u32) -> Result<Forwarder> {
  let endpoint = format!("http://127.0.0.1:{}", proxy_port);
  Ok(
    Forwarder::with_timeout(endpoint.as_str(), Duration::from_secs(timeout))?
      .max_body(max_body as usize),
  )
}

/// `--replace OLD NEW --replace A B` arrives flattened; regroup it.
fn pairs(flat: Vec<String>) -> Vec<(String, String)> {
  flat
    .chunks_exact(2)
    .map(|pair| (pair[0].clone(), pair[1].clone()))
    .collect()
}

fn split_csv(csv: Option<&str>) -> Vec<String> {
  csv
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}

fn parse_one<T: FromStr<Err = String>>(value: &str) -> Result<T> {
  T::from_str(value).map_err(Error::InvalidInput)
}

fn parse_csv<T: FromStr<Err = String>>(csv: Option<&str>) -> Result<Vec<T>> {
  split_csv(csv).iter().map(|s| parse_one(s)).collect()
}

fn print_listing(items: &[TrafficItem]) {
  if items.is_empty() {
    println!("No results.");
    return;
  }
  for item in items {
    let timestamp = item.timestamp.as_deref().unwrap_or("");
    let timestamp = &timestamp[..timestamp.len().min(19)];
    println!(
      "[{:>6}] {}  {:<10}  {}  {:<7}  {}",
      item.id,
      timestamp,
      item.tool.map(|t| t.as_str()).unwrap_or(""),
      item.status_code.unwrap_or(0),
      item.method.as_deref().unwrap_or(""),
      item.full_url(),
    );
  }
}

fn print_item(item: &TrafficItem) {
  println!(
    "[{}] {} {} -> {}",
    item.id,
    item.method.as_deref().unwrap_or(""),
    item.full_url(),
    item.status_code.unwrap_or(0),
  );
  println!("\n=== REQUEST ===");
  println!("{}", item.request_text.as_deref().unwrap_or(""));
  println!("\n=== RESPONSE ===");
  println!("{}", item.response_text.as_deref().unwrap_or(""));
}

fn print_send_result(result: &SendResult) {
  match result.item_id {
    Some(id) => println!("[{}] {} {} -> {}", id, result.method, result.url, result.status_code),
    None => println!("{} {} -> {}", result.method, result.url, result.status_code),
  }
  println!("\n=== RESPONSE HEADERS ===");
  for (name, value) in &result.headers {
    println!("{}: {}", name, value);
  }
  println!("\n=== RESPONSE BODY ===");
  println!("{}", result.body);
}
