use std::path::{Path, PathBuf};

use clap::{Arg, Command as ClapCommand, CommandFactory};
use tracing::info;

use crate::args::{Cli, DocsArgs, DocsFormat};
use crate::error::{AppError, AppResult};

/// One generated page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocPage {
    pub file_name: String,
    pub content: String,
}

/// Writes one page per command into the requested directory.
pub(crate) async fn run_docs(args: &DocsArgs) -> AppResult<()> {
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(args.format.default_out_dir()));
    let pages = render_pages(args.format);
    write_pages(&out_dir, &pages).await?;
    info!("Wrote {} files to {}", pages.len(), out_dir.display());
    Ok(())
}

pub(crate) fn render_pages(format: DocsFormat) -> Vec<DocPage> {
    let mut root = Cli::command();
    root.build();
    let mut pages = Vec::new();
    collect_pages(&mut root, &[], format, &mut pages);
    pages
}

fn collect_pages(
    cmd: &mut ClapCommand,
    parents: &[String],
    format: DocsFormat,
    pages: &mut Vec<DocPage>,
) {
    let mut path = parents.to_vec();
    path.push(cmd.get_name().to_owned());

    let page = match format {
        DocsFormat::Markdown => markdown_page(cmd, &path),
        DocsFormat::Man => man_page(cmd, &path),
    };
    pages.push(page);

    for sub in cmd.get_subcommands_mut() {
        if sub.get_name() == "help" || sub.is_hide_set() {
            continue;
        }
        collect_pages(sub, &path, format, pages);
    }
}

fn markdown_page(cmd: &mut ClapCommand, path: &[String]) -> DocPage {
    let title = path.join(" ");
    let mut lines = vec![format!("## {}", title), String::new()];
    if let Some(about) = cmd.get_about() {
        lines.push(about.to_string());
        lines.push(String::new());
    }
    lines.push("### Synopsis".to_owned());
    lines.push(String::new());
    lines.push("```".to_owned());
    lines.push(cmd.render_long_help().to_string().trim_end().to_owned());
    lines.push("```".to_owned());
    lines.push(String::new());

    let parent = parent_path(path);
    let children = visible_subcommands(cmd);
    if !parent.is_empty() || !children.is_empty() {
        lines.push("### SEE ALSO".to_owned());
        lines.push(String::new());
        if !parent.is_empty() {
            lines.push(format!("* [{}]({}.md)", parent.join(" "), parent.join("_")));
        }
        for (name, about) in children {
            lines.push(format!(
                "* [{} {}]({}_{}.md) - {}",
                title,
                name,
                path.join("_"),
                name,
                about
            ));
        }
        lines.push(String::new());
    }

    DocPage {
        file_name: format!("{}.md", path.join("_")),
        content: lines.join("\n"),
    }
}

fn man_page(cmd: &ClapCommand, path: &[String]) -> DocPage {
    let name = path.join("-");
    let about = cmd.get_about().map(ToString::to_string).unwrap_or_default();
    let mut lines = vec![
        format!(
            ".TH \"{}\" \"1\" \"\" \"stress-test {}\" \"User Commands\"",
            name.to_uppercase(),
            env!("CARGO_PKG_VERSION")
        ),
        ".SH NAME".to_owned(),
        format!("{} \\- {}", roff_escape(&name), roff_escape(&about)),
        ".SH SYNOPSIS".to_owned(),
        format!(".B {}", roff_escape(&path.join(" "))),
        "[OPTIONS]".to_owned(),
    ];

    if let Some(long_about) = cmd.get_long_about().or_else(|| cmd.get_about()) {
        lines.push(".SH DESCRIPTION".to_owned());
        for line in long_about.to_string().lines() {
            if line.trim().is_empty() {
                lines.push(".PP".to_owned());
            } else {
                lines.push(roff_line(line));
            }
        }
    }

    let options: Vec<&Arg> = cmd.get_arguments().filter(|arg| !arg.is_hide_set()).collect();
    if !options.is_empty() {
        lines.push(".SH OPTIONS".to_owned());
        for arg in options {
            lines.push(".TP".to_owned());
            lines.push(option_label(arg));
            let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
            let defaults: Vec<String> = arg
                .get_default_values()
                .iter()
                .map(|value| value.to_string_lossy().into_owned())
                .collect();
            if defaults.is_empty() {
                lines.push(roff_line(&help));
            } else {
                lines.push(roff_line(&format!("{} [default: {}]", help, defaults.join(", "))));
            }
        }
    }

    let parent = parent_path(path);
    let mut refs: Vec<String> = Vec::new();
    if !parent.is_empty() {
        refs.push(format!("{}(1)", parent.join("-")));
    }
    refs.extend(
        visible_subcommands(cmd)
            .into_iter()
            .map(|(sub, _)| format!("{}-{}(1)", name, sub)),
    );
    if !refs.is_empty() {
        lines.push(".SH SEE ALSO".to_owned());
        lines.push(roff_escape(&refs.join(", ")));
    }
    lines.push(String::new());

    DocPage {
        file_name: format!("{}.1", name),
        content: lines.join("\n"),
    }
}

fn parent_path(path: &[String]) -> &[String] {
    path.split_last().map(|(_, rest)| rest).unwrap_or_default()
}

/// `(name, about)` of every documented subcommand.
fn visible_subcommands(cmd: &ClapCommand) -> Vec<(String, String)> {
    cmd.get_subcommands()
        .filter(|sub| sub.get_name() != "help" && !sub.is_hide_set())
        .map(|sub| {
            let about = sub.get_about().map(ToString::to_string).unwrap_or_default();
            (sub.get_name().to_owned(), about)
        })
        .collect()
}

fn option_label(arg: &Arg) -> String {
    let mut names = Vec::new();
    if let Some(short) = arg.get_short() {
        names.push(format!("\\fB\\-{}\\fR", short));
    }
    if let Some(long) = arg.get_long() {
        names.push(format!("\\fB\\-\\-{}\\fR", roff_escape(long)));
    }
    if names.is_empty() {
        names.push(format!("\\fI{}\\fR", roff_escape(arg.get_id().as_str())));
    }
    let takes_value = arg.get_num_args().is_some_and(|range| range.takes_values());
    let mut label = names.join(", ");
    if takes_value
        && !arg.is_positional()
        && let Some(value_names) = arg.get_value_names()
    {
        for value in value_names {
            label.push_str(" \\fI<");
            label.push_str(&roff_escape(value.as_str()));
            label.push_str(">\\fR");
        }
    }
    label
}

fn roff_escape(text: &str) -> String {
    text.replace('\\', "\\e").replace('-', "\\-")
}

/// Escapes a text line and guards lines that roff would read as requests.
fn roff_line(text: &str) -> String {
    let escaped = roff_escape(text);
    if escaped.starts_with('.') || escaped.starts_with('\'') {
        format!("\\&{}", escaped)
    } else {
        escaped
    }
}

async fn write_pages(out_dir: &Path, pages: &[DocPage]) -> AppResult<()> {
    tokio::fs::create_dir_all(out_dir).await?;
    for page in pages {
        let path = out_dir.join(&page.file_name);
        tokio::fs::write(&path, page.content.as_bytes())
            .await
            .map_err(|err| AppError::WriteFile { path, source: err })?;
    }
    Ok(())
}
