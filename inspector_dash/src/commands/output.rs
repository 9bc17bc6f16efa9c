//! Plain terminal output for requests and cards

use crate::card::Card;
use console::style;
use inspector_common::CapturedRequest;

const MAX_PATH_LEN: usize = 50;

/// Print one request as a log line
pub fn print_request(req: &CapturedRequest, live: bool) {
    let marker = if live {
        style("●").green()
    } else {
        style("○").dim()
    };

    println!("  {} {}", marker, request_line(req));
}

/// Styled `time method path client` line
pub fn request_line(req: &CapturedRequest) -> String {
    let method = req.method_str();
    let padded = format!("{:>7}", method);
    let method_styled = match method {
        "GET" => style(padded).green(),
        "POST" => style(padded).yellow(),
        "PUT" => style(padded).blue(),
        "PATCH" => style(padded).magenta(),
        "DELETE" => style(padded).red(),
        "HEAD" => style(padded).cyan(),
        _ => style(padded).white(),
    };

    let path = req.path_str();
    let path_display = if path.chars().count() > MAX_PATH_LEN {
        let head: String = path.chars().take(MAX_PATH_LEN - 3).collect();
        format!("{}...", head)
    } else {
        path.to_string()
    };

    format!(
        "{} {} {} {}",
        style(format!("{:>8}", req.display_time())).dim(),
        method_styled,
        style(path_display).white(),
        style(req.client_ip.as_deref().unwrap_or("")).dim(),
    )
}

/// Print every field and block of a request card
pub fn print_card(req: &CapturedRequest) {
    let card = Card::from_request(req);
    let label_width = card.fields.iter().map(|f| f.label.len()).max().unwrap_or(0) + 2;

    println!("{}", style(&card.title).bold());
    for field in &card.fields {
        println!(
            "  {}{}",
            style(format!("{:<width$}", field.label, width = label_width)).dim(),
            field.value
        );
    }
    for block in &card.blocks {
        println!("  {}", style(block.label).cyan().bold());
        for line in block.text.lines() {
            println!("    {}", style(line).yellow());
        }
    }
    println!();
}
