use colored::Colorize;
use creatorverse_lib::{Repository, Result, list::ListSync};
use tracing::info;

use crate::creator::summary;

/// Keep a synced list until Ctrl-C, printing it after every change.
pub async fn run(repo: &Repository) -> Result<()> {
    let mut sync = ListSync::start(repo).await?;
    print_list(&sync);

    if !sync.is_live() {
        println!("{}", "Live updates unavailable".yellow());
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
            event = sync.next_event() => match event {
                Some(event) => {
                    println!("{}", format!("-- {} {}", event.kind(), event.id()).dimmed());
                    print_list(&sync);
                }
                None => {
                    println!("{}", "Change feed closed".yellow());
                    break;
                }
            },
        }
    }

    sync.stop();
    Ok(())
}

fn print_list(sync: &ListSync) {
    let creators = sync.store().creators();

    if creators.is_empty() {
        println!("No creators yet");
    }
    for creator in creators {
        println!("{}", summary(creator));
    }
}
