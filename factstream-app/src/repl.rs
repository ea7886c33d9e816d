use anyhow::Result;
use factstream_core::{CardSource, FactCard, FeedAction, FeedSession};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: topic <t> | more <id> | skip [id] | ask <id> <question> | deep <id> | next | list | quit";

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Topic(String),
    Act(String, FeedAction),
    Next,
    List,
    Help,
    Quit,
}

fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let (id, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));

    match verb {
        "topic" if !rest.is_empty() => Some(Command::Topic(rest.to_string())),
        "more" if !id.is_empty() => Some(Command::Act(id.to_string(), FeedAction::More)),
        "skip" => Some(Command::Act(id.to_string(), FeedAction::Skip)),
        "ask" if !id.is_empty() => Some(Command::Act(
            id.to_string(),
            FeedAction::Custom(tail.trim().to_string()),
        )),
        "deep" if !id.is_empty() => Some(Command::Act(id.to_string(), FeedAction::Deep)),
        "next" => Some(Command::Next),
        "list" => Some(Command::List),
        "help" | "?" => Some(Command::Help),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

fn print_cards(cards: &[FactCard]) {
    if cards.is_empty() {
        println!("(no new cards)");
    }
    for card in cards {
        if card.is_deep_research {
            println!("== [{}] {}", card.id, card.headline);
            println!("{}\n", card.detail.as_deref().unwrap_or_default());
            continue;
        }
        println!("[{}] {}", card.id, card.headline);
        if let Some(detail) = &card.detail {
            println!("    {detail}");
        }
    }
}

/// Drive a [`FeedSession`] from stdin until `quit` or EOF.
pub async fn run(source: Arc<dyn CardSource>, topic: Option<String>) -> Result<()> {
    let mut feed = FeedSession::new(source);
    if let Some(topic) = topic.filter(|t| !t.trim().is_empty()) {
        print_cards(feed.search(&topic).await);
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_line(&line) else {
            println!("{HELP}");
            continue;
        };
        tracing::debug!(?command, "feed.command");

        match command {
            Command::Topic(topic) => print_cards(feed.search(&topic).await),
            Command::Act(id, action) => {
                if feed.topic().is_none() {
                    println!("pick a topic first");
                    continue;
                }
                if action != FeedAction::Skip && feed.find(&id).is_none() {
                    println!("no card with id {id}");
                    continue;
                }
                print_cards(&feed.apply(&id, action).await);
            }
            Command::Next => print_cards(&feed.load_next_page().await),
            Command::List => {
                print_cards(feed.cards());
                if !feed.research().is_empty() {
                    println!("-- research --");
                    print_cards(feed.research());
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }
    Ok(())
}
