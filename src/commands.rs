use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Error, Result};

use crate::{
    mood::Mood,
    session::{SanctuarySession, SessionSnapshot},
    settings::SettingsStore,
    timer::FocusStatus,
};

pub const HELP: &str = "\
commands:
  write <text>     replace the journal draft (mood follows the text)
  mood <name>      pick a mood: calm, happy, neutral, stressed
  save             save the draft as a journal entry
  clear            clear the draft
  entries          list saved entries, newest first
  focus [minutes]  start a focus countdown (default length if omitted)
  preset [n]       list the focus presets, or start preset n
  stop             stop the focus countdown
  run              stream the script endpoint's output
  cancel           abort the running script
  endpoint <url>   change and persist the script endpoint
  status           show everything
  help             this text
  quit             leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write(String),
    Mood(Mood),
    Save,
    Clear,
    Entries,
    Focus(Option<u32>),
    Preset(Option<usize>),
    Stop,
    Run,
    Cancel,
    Endpoint(String),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "write" => Command::Write(rest.to_string()),
            "mood" => Command::Mood(rest.parse()?),
            "save" => Command::Save,
            "clear" => Command::Clear,
            "entries" => Command::Entries,
            "focus" if rest.is_empty() => Command::Focus(None),
            "focus" => Command::Focus(Some(
                rest.parse::<u32>()
                    .with_context(|| format!("'{rest}' is not a number of minutes"))?,
            )),
            "preset" | "presets" if rest.is_empty() => Command::Preset(None),
            "preset" => Command::Preset(Some(
                rest.parse::<usize>()
                    .with_context(|| format!("'{rest}' is not a preset number"))?,
            )),
            "stop" => Command::Stop,
            "run" => Command::Run,
            "cancel" => Command::Cancel,
            "endpoint" if rest.is_empty() => bail!("endpoint needs a URL"),
            "endpoint" => Command::Endpoint(rest.to_string()),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "" => bail!("empty command"),
            other => return Err(anyhow!("unknown command '{other}' (try 'help')")),
        };
        Ok(command)
    }
}

/// What the front end should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    /// The script run was started in the background; output follows as events.
    RunStarted,
    Quit,
}

pub async fn execute(
    session: &SanctuarySession,
    settings: &SettingsStore,
    command: Command,
) -> Result<Reply> {
    let reply = match command {
        Command::Write(text) => {
            let mood = session.set_journal_text(text).await;
            Reply::Text(format!("mood: {}", mood.theme().label))
        }
        Command::Mood(mood) => {
            session.set_mood(mood).await;
            Reply::Text(format!("mood: {}", mood.theme().label))
        }
        Command::Save => match session.save_journal().await {
            Some(entry) => Reply::Text(format!("saved entry {} ({})", entry.id, entry.mood)),
            None => Reply::Text(String::new()),
        },
        Command::Clear => {
            session.clear_journal().await;
            Reply::Text("draft cleared".into())
        }
        Command::Entries => Reply::Text(render_entries(&session.snapshot().await)),
        Command::Focus(minutes) => {
            let minutes = minutes.unwrap_or(settings.get().default_focus_minutes);
            let snapshot = session.start_focus(minutes).await?;
            Reply::Text(format!("focus started: {}", snapshot.clock))
        }
        Command::Preset(None) => Reply::Text(render_presets(&settings.get().focus_presets)),
        Command::Preset(Some(index)) => {
            let presets = settings.get().focus_presets;
            let Some(&minutes) = index.checked_sub(1).and_then(|i| presets.get(i)) else {
                bail!("no preset {index} (try 'preset' to list them)");
            };
            let snapshot = session.start_focus(minutes).await?;
            Reply::Text(format!("focus started: {}", snapshot.clock))
        }
        Command::Stop => {
            let snapshot = session.stop_focus().await?;
            Reply::Text(format!("focus stopped at {}", snapshot.clock))
        }
        Command::Run => Reply::RunStarted,
        Command::Cancel => {
            if session.cancel_script() {
                Reply::Text("cancelling script".into())
            } else {
                Reply::Text("no script running".into())
            }
        }
        Command::Endpoint(url) => {
            settings.update_script_endpoint(&url)?;
            session.set_script_endpoint(url.trim());
            Reply::Text(format!("endpoint set to {}", url.trim()))
        }
        Command::Status => Reply::Text(render_status(&session.snapshot().await)),
        Command::Help => Reply::Text(HELP.into()),
        Command::Quit => Reply::Quit,
    };
    Ok(reply)
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let focus_state = match snapshot.focus.state.status {
        FocusStatus::Running => "running",
        FocusStatus::Idle => "idle",
    };
    let output = if snapshot.script_output.is_empty() {
        "(no output yet)"
    } else {
        snapshot.script_output.as_str()
    };

    format!(
        "mood: {} {}\nengagement: {:.1}  garden: {}  streak: {}\nfocus: {} ({})\ndraft: {}\nentries: {}\nscript: {}\n{}",
        snapshot.theme.label,
        snapshot.theme.accent,
        snapshot.engagement,
        "*".repeat(snapshot.garden_size as usize),
        snapshot.streak,
        snapshot.focus.clock,
        focus_state,
        snapshot.draft,
        snapshot.entries.len(),
        if snapshot.script_running { "running" } else { "idle" },
        output,
    )
}

pub fn render_presets(presets: &[u32]) -> String {
    if presets.is_empty() {
        return "no focus presets configured".into();
    }
    presets
        .iter()
        .enumerate()
        .map(|(i, minutes)| format!("{}) {minutes} min", i + 1))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_entries(snapshot: &SessionSnapshot) -> String {
    if snapshot.entries.is_empty() {
        return "no entries yet".into();
    }
    snapshot
        .entries
        .iter()
        .map(|entry| {
            format!(
                "[{}] {} {}",
                entry.created_at.format("%Y-%m-%d %H:%M"),
                entry.mood.theme().label,
                entry.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
