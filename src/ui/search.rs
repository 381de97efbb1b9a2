//! Address search box
//!
//! ```text
//! Idle -> Typing -> SuggestionsShown -> Selected -> Idle
//!           ^              |               |
//!           +--------------+---------------+   (further typing)
//! ```
//!
//! Selecting a suggestion fills the input with its description and closes
//! the list before the geocode request goes out, so the list never stays
//! open while the address resolves.

use crate::services::places::{PlacesError, QuerySequencer, QueryTicket, Suggestion};
use egui::{RichText, Ui};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Typing,
    SuggestionsShown,
    Selected,
}

/// Work the shell has to start on behalf of the search box
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    Query(QueryTicket),
    Resolve(Suggestion),
}

pub struct SearchBox {
    text: String,
    state: SearchState,
    suggestions: Vec<Suggestion>,
    sequencer: QuerySequencer,
    enabled: bool,
}

impl SearchBox {
    /// `sequencer` must be the one the resolver checks, so both sides agree
    /// on which query is the latest
    pub fn new(sequencer: QuerySequencer) -> Self {
        Self {
            text: String::new(),
            state: SearchState::Idle,
            suggestions: Vec::new(),
            sequencer,
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    /// New input text. Returns the query to issue, if any; every earlier
    /// query becomes stale either way.
    pub fn on_input(&mut self, text: impl Into<String>) -> Option<QueryTicket> {
        self.text = text.into();
        self.suggestions.clear();

        if self.text.trim().is_empty() {
            self.sequencer.invalidate();
            self.state = SearchState::Idle;
            return None;
        }

        self.state = SearchState::Typing;
        Some(self.sequencer.issue(self.text.clone()))
    }

    /// Applies the answer to query `seq`. Stale answers, and answers that
    /// arrive after a selection, are ignored. Returns whether the list was
    /// updated.
    pub fn apply_suggestions(
        &mut self,
        seq: u64,
        result: Result<Vec<Suggestion>, PlacesError>,
    ) -> bool {
        if !self.sequencer.is_latest(seq)
            || !matches!(self.state, SearchState::Typing | SearchState::SuggestionsShown)
        {
            log::debug!("ignoring suggestions for stale query #{}", seq);
            return false;
        }

        match result {
            Ok(suggestions) => {
                self.state = if suggestions.is_empty() {
                    SearchState::Typing
                } else {
                    SearchState::SuggestionsShown
                };
                self.suggestions = suggestions;
                true
            }
            Err(_) => {
                self.suggestions.clear();
                self.state = SearchState::Typing;
                false
            }
        }
    }

    /// Picks the suggestion at `index`: fills the input, closes the list
    /// and returns the suggestion to resolve
    pub fn select(&mut self, index: usize) -> Option<Suggestion> {
        let suggestion = self.suggestions.get(index).cloned()?;

        self.text = suggestion.description.clone();
        self.suggestions.clear();
        self.sequencer.invalidate();
        self.state = SearchState::Selected;
        Some(suggestion)
    }

    /// The geocode request for the selection finished
    pub fn finish_resolution(&mut self) {
        if self.state == SearchState::Selected {
            self.state = SearchState::Idle;
        }
    }

    pub fn show(&mut self, ui: &mut Ui) -> Option<SearchAction> {
        let mut action = None;

        let hint = if self.enabled {
            "Search an address"
        } else {
            "Address search unavailable"
        };
        let response = ui.add_enabled(
            self.enabled,
            egui::TextEdit::singleline(&mut self.text)
                .hint_text(hint)
                .desired_width(280.0),
        );
        if response.changed() {
            let text = self.text.clone();
            action = self.on_input(text).map(SearchAction::Query);
        }

        if self.state == SearchState::SuggestionsShown {
            let mut picked = None;
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_width(280.0);
                for (index, suggestion) in self.suggestions.iter().enumerate() {
                    if ui
                        .selectable_label(false, RichText::new(&suggestion.description))
                        .clicked()
                    {
                        picked = Some(index);
                    }
                }
            });
            if let Some(suggestion) = picked.and_then(|index| self.select(index)) {
                action = Some(SearchAction::Resolve(suggestion));
            }
        }

        action
    }
}
