use tokio::io::{AsyncWrite, AsyncWriteExt};

use qm_search::{Item, Publication, View};

pub async fn prompt<W>(out: &mut W) -> std::io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	write_text(out, &View::PromptForInput.status_line()).await
}

pub async fn publication<W>(out: &mut W, publication: &Publication) -> std::io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	let mut text = format!("[{}] {}\n", publication.version, publication.view.status_line());

	for (rank, item) in publication.view.rows().iter().enumerate() {
		text.push_str(&format_item(rank + 1, item));
	}

	write_text(out, text.trim_end()).await
}

fn format_item(rank: usize, item: &Item) -> String {
	let mut text = format!("  {rank:>3}. {}\n", item.title);

	if !item.url.is_empty() {
		text.push_str(&format!("       {}\n", item.url));
	}
	if !item.description.is_empty() {
		text.push_str(&format!("       {}\n", item.description));
	}

	let mut meta: Vec<String> = item.tags.iter().map(|tag| format!("#{tag}")).collect();

	if !item.collection_name.is_empty() {
		meta.push(format!("[{}]", item.collection_name));
	}
	if !meta.is_empty() {
		text.push_str(&format!("       {}\n", meta.join(" ")));
	}

	text
}

async fn write_text<W>(out: &mut W, text: &str) -> std::io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	out.write_all(text.as_bytes()).await?;
	out.write_all(b"\n").await?;
	out.flush().await
}
