//! Markup for the search panel and its result list

use minijinja::{context, Environment, Value};
use serde::Serialize;

use crate::aggregate::ResultSet;
use crate::filter::{SearchForm, SortKey};

pub const SITE_URL: &str = "https://chub.ai";

/// Topic tags shown per character
pub const DISPLAY_TAG_LIMIT: usize = 5;

/// The leading tags shown for a character
pub fn display_tags(tags: &[String]) -> &[String] {
    &tags[..tags.len().min(DISPLAY_TAG_LIMIT)]
}

/// What the result list area currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Idle,
    Searching,
    NoResults,
    Failed,
}

#[derive(Serialize)]
struct ItemView<'a> {
    identifier: &'a str,
    display_name: &'a str,
    author_handle: &'a str,
    short_description: &'a str,
    tags: &'a [String],
    asset: Option<&'a str>,
}

#[derive(Serialize)]
struct SortOption<'a> {
    value: &'a str,
    label: &'a str,
    selected: bool,
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("list.html", include_str!("../templates/list.html.jinja"))?;
        env.add_template("panel.html", include_str!("../templates/panel.html.jinja"))?;
        Ok(Self { env })
    }

    fn items(results: Option<&ResultSet>) -> Vec<ItemView<'_>> {
        results
            .map(|set| {
                set.iter()
                    .map(|entry| {
                        let record = &entry.record;
                        ItemView {
                            identifier: &record.identifier,
                            display_name: &record.display_name,
                            author_handle: &record.author_handle,
                            short_description: &record.short_description,
                            tags: display_tags(&record.topic_tags),
                            asset: entry.asset.as_ref().map(|uri| uri.as_str()),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn render_list(&self, results: &ResultSet) -> Result<String, minijinja::Error> {
        self.env.get_template("list.html")?.render(context! {
            items => Self::items(Some(results)),
            site_url => SITE_URL,
        })
    }

    pub fn render_panel(
        &self,
        panel_id: u64,
        form: &SearchForm,
        status: ListStatus,
        results: Option<&ResultSet>,
    ) -> Result<String, minijinja::Error> {
        let mut sort_options: Vec<SortOption> = SortKey::ALL
            .iter()
            .map(|key| SortOption {
                value: key.as_str(),
                label: key.label(),
                selected: *key == form.sort,
            })
            .collect();
        if let SortKey::Other(key) = &form.sort {
            sort_options.push(SortOption {
                value: key,
                label: key,
                selected: true,
            });
        }

        self.env.get_template("panel.html")?.render(context! {
            panel_id => panel_id,
            form => Value::from_serialize(form),
            status => status,
            items => Self::items(results),
            site_url => SITE_URL,
            sort_options => sort_options,
        })
    }
}
