use serde::{Deserialize, Serialize};

use crate::domain::Bib;
use crate::error::PhotoError;

pub const DEFAULT_HIGH_URL: &str =
    "https://botapracorrer.fotop.com.br/fotos/commerceft/download/download-foto-avulsa/a/{}";

const LISTING_URL_PREFIX: &str = "https://botapracorrer.fotop.com.br/fotos/eventos/busca/id/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub key: String,
    pub year: String,
    pub name: String,
    pub listing_url: String,
    pub high_url: String,
}

impl Event {
    pub fn listing_url_for(&self, bib: &Bib) -> String {
        fill_template(&self.listing_url, bib.as_str())
    }

    pub fn high_url_for(&self, photo_id: &str) -> String {
        fill_template(&self.high_url, photo_id)
    }
}

pub fn fill_template(template: &str, value: &str) -> String {
    match template.split_once("{}") {
        Some((head, tail)) => format!("{head}{value}{tail}"),
        None => format!("{template}{value}"),
    }
}

#[derive(Debug, Clone)]
pub struct EventCatalog {
    events: Vec<Event>,
}

impl EventCatalog {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn builtin() -> Self {
        let entries = [
            ("bpc_jalapao", "2019", "Olympikus Bota Pra Correr Jalapão", "19735"),
            ("bpc_pantanal", "2019", "Olympikus Bota Pra Correr Pantanal", "22591"),
            ("bpc_alter_chao", "2019", "Olympikus Bota Pra Correr Alter do Chao", "24747"),
            ("bpc_veadeiros", "2022", "Olympikus Bota Pra Correr 2022 - Veadeiros", "51646"),
            ("bpc_milagres", "2022", "Olympikus Bota Pra Correr 2022 - Milagres", "55422"),
            ("bpc_conde", "2022", "Bota Pra Correr Costa do Conde", "76437"),
        ];
        let events = entries
            .into_iter()
            .map(|(key, year, name, event_id)| Event {
                key: key.to_string(),
                year: year.to_string(),
                name: name.to_string(),
                listing_url: format!("{LISTING_URL_PREFIX}{{}}/evento/{event_id}/busca/numero"),
                high_url: DEFAULT_HIGH_URL.to_string(),
            })
            .collect();
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn resolve(&self, path: &str) -> Result<&Event, PhotoError> {
        self.events
            .iter()
            .find(|event| path.contains(event.key.as_str()))
            .ok_or_else(|| PhotoError::UnknownEvent(path.to_string()))
    }
}

impl Default for EventCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolve_by_substring() {
        let catalog = EventCatalog::builtin();
        let event = catalog.resolve("data/bpc_conde_2022.csv").unwrap();
        assert_eq!(event.key, "bpc_conde");
        assert_eq!(event.year, "2022");
    }

    #[test]
    fn resolve_unknown_event() {
        let catalog = EventCatalog::builtin();
        let err = catalog.resolve("data/other_race.csv").unwrap_err();
        assert_matches!(err, PhotoError::UnknownEvent(_));
    }

    #[test]
    fn first_match_wins() {
        let make = |key: &str| Event {
            key: key.to_string(),
            year: "2020".to_string(),
            name: key.to_string(),
            listing_url: "https://example.test/{}".to_string(),
            high_url: DEFAULT_HIGH_URL.to_string(),
        };
        let catalog = EventCatalog::new(vec![make("race"), make("race_b")]);
        assert_eq!(catalog.resolve("race_b.csv").unwrap().key, "race");
    }

    #[test]
    fn listing_url_substitutes_bib() {
        let catalog = EventCatalog::builtin();
        let event = catalog.resolve("bpc_jalapao").unwrap();
        let bib: Bib = "512".parse().unwrap();
        assert_eq!(
            event.listing_url_for(&bib),
            "https://botapracorrer.fotop.com.br/fotos/eventos/busca/id/512/evento/19735/busca/numero"
        );
        assert!(event.high_url_for("101").ends_with("/a/101"));
    }
}
