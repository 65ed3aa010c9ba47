use clap::Args;
use colored::Colorize;
use creatorverse_lib::{
    Repository, Result,
    form::{CreatorForm, EditForm, Field},
    repository::{Creator, CreatorId},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    name: String,
    /// Link to the creator's channel or page
    #[arg(long)]
    url: String,
    #[arg(long)]
    description: String,
    #[arg(long)]
    imageurl: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Pass an empty string to remove the image
    #[arg(long)]
    imageurl: Option<String>,
}

pub async fn list(repo: &Repository) -> Result<()> {
    let creators = repo.creators().await?;

    if creators.is_empty() {
        println!("No creators yet. Add one with `creatorverse add`.");
    }
    for creator in &creators {
        println!("{}", summary(creator));
    }

    Ok(())
}

pub async fn show(repo: &Repository, id: CreatorId) -> Result<()> {
    let creator = repo.creator(id).await?;
    print!("{}", details(&creator));
    Ok(())
}

pub async fn add(repo: &Repository, args: &AddArgs) -> Result<()> {
    let form = CreatorForm {
        name: args.name.clone(),
        url: args.url.clone(),
        description: args.description.clone(),
        imageurl: args.imageurl.clone().unwrap_or_default(),
    };

    let creator = repo.add_creator(&form).await?;
    println!("Added {} ({})", creator.name().bold(), creator.id());

    Ok(())
}

pub async fn edit(repo: &Repository, args: &EditArgs) -> Result<()> {
    let id = CreatorId(args.id);
    let creator = repo.creator(id).await?;

    let mut form = EditForm::new(&creator);
    let changes = [
        (Field::Name, &args.name),
        (Field::Url, &args.url),
        (Field::Description, &args.description),
        (Field::ImageUrl, &args.imageurl),
    ];
    for (field, value) in changes {
        if let Some(value) = value {
            form.draft.set(field, value.clone());
        }
    }

    repo.update_creator(id, &form).await?;
    println!("Updated {}", form.draft.name.bold());

    Ok(())
}

pub async fn delete(repo: &Repository, id: CreatorId, yes: bool) -> Result<()> {
    let creator = repo.creator(id).await?;

    if !yes && !confirm(&format!("Delete {}?", creator.name())).await {
        println!("Nothing deleted");
        return Ok(());
    }

    repo.delete_creator(id).await?;
    println!("Deleted {}", creator.name().bold());

    Ok(())
}

/// Ask a yes/no question on stdin. Anything other than an explicit yes is a no.
async fn confirm(question: &str) -> bool {
    let mut stdout = tokio::io::stdout();
    let prompt = format!("{question} [y/N] ");
    if stdout.write_all(prompt.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
        return false;
    }

    let mut answer = String::new();
    match BufReader::new(tokio::io::stdin()).read_line(&mut answer).await {
        Ok(_) => is_yes(&answer),
        Err(_) => false,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// One line per creator, used by `list` and `watch`.
pub fn summary(creator: &Creator) -> String {
    format!(
        "{:>5}  {}  {}",
        creator.id().to_string().dimmed(),
        creator.name().bold(),
        creator.url().blue()
    )
}

fn details(creator: &Creator) -> String {
    let mut out = format!(
        "{}\n{}\n\n{}\n",
        creator.name().bold(),
        creator.url().blue(),
        creator.description()
    );
    if let Some(imageurl) = creator.imageurl() {
        out.push_str(&format!("\nImage: {imageurl}\n"));
    }
    out.push_str(&format!(
        "Added {}\n",
        creator.created_at().format("%Y-%m-%d %H:%M")
    ));

    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }
}
