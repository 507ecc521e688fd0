// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `cellarium add` command implementation.
//!
//! A line-based walk through the add-wine wizard with readline editing.
//! Every step reads commands until the wizard moves on; `:q` or Ctrl-D
//! cancels at any prompt.

use std::sync::Arc;

use cellarium_core::{CatalogApi, CellarError, StoreId, Wine};
use cellarium_flow::{
    SearchSnapshot, StepKind, WineCreation, WizardController, WizardOptions, WizardOutcome,
    WizardStep,
};
use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::catalog;

/// What a prompt produced.
enum Input {
    Line(String),
    Quit,
}

struct Prompter {
    rl: DefaultEditor,
}

impl Prompter {
    fn new() -> Result<Self, CellarError> {
        let rl = DefaultEditor::new()
            .map_err(|e| CellarError::Internal(format!("failed to initialize readline: {e}")))?;
        Ok(Self { rl })
    }

    fn ask(&mut self, label: &str) -> Input {
        let prompt = format!("{} ", format!("{label}>").green());
        match self.rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim().to_string();
                if line == ":q" {
                    return Input::Quit;
                }
                if !line.is_empty() {
                    let _ = self.rl.add_history_entry(line.as_str());
                }
                Input::Line(line)
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Input::Quit,
            Err(e) => {
                warn!(error = %e, "readline error");
                Input::Quit
            }
        }
    }

    /// Asks for an optional value; an empty line keeps `current`.
    fn ask_field(&mut self, label: &str, current: Option<&str>) -> Option<Option<String>> {
        let label = match current {
            Some(value) if !value.is_empty() => format!("{label} [{value}]"),
            _ => label.to_string(),
        };
        match self.ask(&label) {
            Input::Quit => None,
            Input::Line(line) if line.is_empty() => Some(current.map(str::to_string)),
            Input::Line(line) if line == "-" => Some(None),
            Input::Line(line) => Some(Some(line)),
        }
    }
}

pub async fn run(api: Arc<dyn CatalogApi>, options: WizardOptions) -> Result<(), CellarError> {
    let mut prompter = Prompter::new()?;
    let mut wizard = WizardController::open(api.clone(), options);

    println!("{}", "add a wine".bold().green());
    println!("Type {} at any prompt to quit.\n", ":q".yellow());

    while !wizard.is_closed() {
        let keep_going = match wizard.kind() {
            StepKind::Identify => identify(&mut prompter, &mut wizard).await,
            StepKind::Intent => intent(&mut prompter, &mut wizard),
            StepKind::Bought => bought(&mut prompter, &mut wizard).await,
            StepKind::Drank => drank(&mut prompter, &mut wizard).await,
            StepKind::Closed => break,
        };
        if !keep_going && !wizard.is_closed() {
            wizard.cancel()?;
        }
    }

    match wizard.outcome() {
        Some(WizardOutcome::Saved { wine }) => {
            println!("{} saved {}", "✓".green(), wine.name.bold());
        }
        Some(WizardOutcome::OpenWine { wine }) => {
            catalog::show_wine(api.as_ref(), wine.id).await?;
        }
        Some(WizardOutcome::Cancelled) | None => println!("cancelled"),
    }
    Ok(())
}

/// Prints a failed action's error; true when the action succeeded.
fn report(result: Result<impl Sized, CellarError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            print_error(&e);
            false
        }
    }
}

// --- Identify ---

async fn identify(prompter: &mut Prompter, wizard: &mut WizardController) -> bool {
    if wizard.creation().is_some() {
        return create_wine(prompter, wizard).await;
    }
    let results = wizard.search_results().results;
    if !results.is_empty() {
        println!(
            "pick a number, {} to create \"{}\", or search again",
            ":new".yellow(),
            wizard.query()
        );
    }
    let line = match prompter.ask("search") {
        Input::Quit => return false,
        Input::Line(line) => line,
    };

    if line == ":new" {
        return report(wizard.begin_create_wine().map(|_| ()));
    }
    if let Ok(n) = line.parse::<usize>()
        && let Some(wine) = n.checked_sub(1).and_then(|i| results.get(i))
    {
        return report(wizard.pick_wine(wine.clone()));
    }

    let mut rx = wizard.subscribe_search();
    if !report(wizard.set_query(&line)) {
        return true;
    }
    let snapshot = settled(&mut rx).await;
    print_results(&snapshot);
    true
}

/// Waits until the latest query's outcome has been applied.
async fn settled(rx: &mut watch::Receiver<SearchSnapshot<Wine>>) -> SearchSnapshot<Wine> {
    loop {
        {
            let snapshot = rx.borrow_and_update();
            if !snapshot.pending {
                return snapshot.clone();
            }
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

fn print_results(snapshot: &SearchSnapshot<Wine>) {
    if let Some(error) = &snapshot.error {
        eprintln!("{} {error}", "search failed:".red());
        return;
    }
    if snapshot.query.is_empty() {
        return;
    }
    if snapshot.results.is_empty() {
        println!("no matches; type {} to create it", ":new".yellow());
    }
    for (i, wine) in snapshot.results.iter().enumerate() {
        let summary = wine.summary_line();
        println!("  {:>2}. {}  {}", i + 1, wine.name.bold(), summary.dimmed());
    }
}

async fn create_wine(prompter: &mut Prompter, wizard: &mut WizardController) -> bool {
    let Some(form) = wizard.creation_mut() else {
        return true;
    };
    if !fill_wine_form(prompter, form) {
        return false;
    }
    match prompter.ask("region (search, :new, or empty to skip)") {
        Input::Quit => return false,
        Input::Line(line) if line.is_empty() => {}
        Input::Line(line) if line == ":new" => {
            let Input::Line(name) = prompter.ask("new region name") else {
                return false;
            };
            report(wizard.create_region(&name, None).await);
        }
        Input::Line(query) => {
            if !pick_region(prompter, wizard, &query).await {
                return false;
            }
        }
    }

    match prompter.ask("save wine? [Y/n/back]") {
        Input::Quit => false,
        Input::Line(answer) if answer.eq_ignore_ascii_case("back") => {
            report(wizard.cancel_create_wine());
            true
        }
        Input::Line(answer) if answer.eq_ignore_ascii_case("n") => true,
        Input::Line(_) => {
            report(wizard.submit_new_wine().await);
            true
        }
    }
}

fn fill_wine_form(prompter: &mut Prompter, form: &mut WineCreation) -> bool {
    let draft = form.draft().clone();
    let Some(name) = prompter.ask_field("name", Some(&draft.name)) else {
        return false;
    };
    form.set_name(name.unwrap_or_default());

    let Some(country) = prompter.ask_field("country", draft.country.as_deref()) else {
        return false;
    };
    form.set_country(country);

    let vintage = draft.vintage.map(|v| v.to_string());
    let Some(vintage) = prompter.ask_field("vintage", vintage.as_deref()) else {
        return false;
    };
    form.draft_mut().vintage = vintage.and_then(|v| v.parse().ok());

    let Some(wine_type) = prompter.ask_field("type", draft.wine_type.as_deref()) else {
        return false;
    };
    form.draft_mut().wine_type = wine_type;

    let Some(grapes) = prompter.ask_field("grapes", draft.grape_varieties.as_deref()) else {
        return false;
    };
    form.draft_mut().grape_varieties = grapes;
    true
}

async fn pick_region(prompter: &mut Prompter, wizard: &mut WizardController, query: &str) -> bool {
    let regions = match wizard.search_regions(query).await {
        Ok(regions) => regions,
        Err(e) => {
            print_error(&e);
            return true;
        }
    };
    if regions.is_empty() {
        println!("no regions match \"{query}\"");
        return true;
    }
    for (i, region) in regions.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, catalog::region_row(region));
    }
    let Input::Line(choice) = prompter.ask("region number") else {
        return false;
    };
    match choice.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
        Some(i) if i < regions.len() => {
            if let Some(form) = wizard.creation_mut() {
                form.select_region(regions[i].clone());
            }
        }
        _ => debug!("no region selected"),
    }
    true
}

// --- Intent ---

fn intent(prompter: &mut Prompter, wizard: &mut WizardController) -> bool {
    let WizardStep::Intent { wine, is_new } = wizard.step() else {
        return true;
    };
    let finish = if *is_new { "[s]ave" } else { "[o]pen" };
    println!(
        "{}: [b]ought, [d]rank, {finish}, [<] back",
        wine.name.bold()
    );
    let Input::Line(choice) = prompter.ask("intent") else {
        return false;
    };
    let result = match choice.as_str() {
        "b" => wizard.choose_bought(),
        "d" => wizard.choose_drank(),
        "s" => wizard.just_save(),
        "o" => wizard.open_detail(),
        "<" => wizard.back(),
        _ => return true,
    };
    report(result);
    true
}

// --- Bought ---

async fn bought(prompter: &mut Prompter, wizard: &mut WizardController) -> bool {
    if wizard.failed_bottles() > 0 {
        return retry(prompter, wizard).await;
    }
    let Ok(draft) = wizard.bottle_draft_mut() else {
        return true;
    };
    let current = draft.clone();

    let quantity = current.quantity.to_string();
    let Some(quantity) = prompter.ask_field("quantity", Some(&quantity)) else {
        return false;
    };
    let Some(price) = prompter.ask_field("price", current.price.as_deref()) else {
        return false;
    };
    let store = current.store.map(|s| s.to_string());
    let Some(store) = prompter.ask_field("store id", store.as_deref()) else {
        return false;
    };
    let date = current.purchase_date.to_string();
    let Some(date) = prompter.ask_field("purchase date", Some(&date)) else {
        return false;
    };

    if let Ok(draft) = wizard.bottle_draft_mut() {
        draft.quantity = quantity.and_then(|q| q.parse().ok()).unwrap_or(0);
        draft.price = price;
        draft.store = store.and_then(|s| s.parse().ok()).map(StoreId);
        if let Some(date) = date.and_then(|d| d.parse().ok()) {
            draft.purchase_date = date;
        }
    }

    match prompter.ask("add bottles? [Y/n/back]") {
        Input::Quit => false,
        Input::Line(answer) if answer.eq_ignore_ascii_case("back") => {
            report(wizard.back());
            true
        }
        Input::Line(answer) if answer.eq_ignore_ascii_case("n") => true,
        Input::Line(_) => {
            if let Ok(report) = wizard.submit_bought().await.inspect_err(print_error)
                && let Some(summary) = report.failure_summary()
            {
                eprintln!("{} {summary}", "warning:".yellow().bold());
            }
            true
        }
    }
}

async fn retry(prompter: &mut Prompter, wizard: &mut WizardController) -> bool {
    let failed = wizard.failed_bottles();
    match prompter.ask(&format!("retry {failed} failed? [Y/n]")) {
        Input::Quit => false,
        Input::Line(answer) if answer.eq_ignore_ascii_case("n") => report(wizard.cancel()),
        Input::Line(_) => {
            report(wizard.retry_failed().await);
            true
        }
    }
}

// --- Drank ---

async fn drank(prompter: &mut Prompter, wizard: &mut WizardController) -> bool {
    let Some(rating) = prompter.ask_field("rating 0-5", None) else {
        return false;
    };
    if let Some(rating) = rating {
        match rating.parse::<u8>() {
            Ok(value) => {
                if !report(wizard.set_rating(value)) {
                    return true;
                }
            }
            Err(_) => {
                eprintln!("{} rating must be a number", "error:".red().bold());
                return true;
            }
        }
    }
    let Some(notes) = prompter.ask_field("notes", None) else {
        return false;
    };
    if let Ok(draft) = wizard.memory_draft_mut() {
        draft.notes = notes.unwrap_or_default();
    }

    match prompter.ask("save memory? [Y/n/back]") {
        Input::Quit => false,
        Input::Line(answer) if answer.eq_ignore_ascii_case("back") => {
            report(wizard.back());
            true
        }
        Input::Line(answer) if answer.eq_ignore_ascii_case("n") => true,
        Input::Line(_) => {
            report(wizard.submit_drank().await);
            true
        }
    }
}

fn print_error(e: &CellarError) {
    eprintln!("{} {e}", "error:".red().bold());
}
