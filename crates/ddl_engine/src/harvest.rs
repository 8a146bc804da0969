use std::collections::HashSet;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_info};

use crate::page::Page;
use crate::postprocess::PostProcessor;
use crate::resolve::resolve_candidate;
use crate::rules::RuleTable;
use crate::store::{QueueStore, StoreError};
use crate::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Run every resolved link through the post-processor before the duplicate check.
    pub post_process: bool,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self { post_process: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarvestReport {
    /// Links appended by this harvest, in insertion order.
    pub added: Vec<String>,
    /// Whole queue after the harvest.
    pub queue: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Runs the rule table over a page and appends new links to the queue.
pub struct Harvester {
    rules: Arc<RuleTable>,
    post_processor: PostProcessor,
    client: Arc<dyn HttpClient>,
    store: QueueStore,
    options: HarvestOptions,
}

impl Harvester {
    pub fn new(
        rules: Arc<RuleTable>,
        post_processor: PostProcessor,
        client: Arc<dyn HttpClient>,
        store: QueueStore,
        options: HarvestOptions,
    ) -> Self {
        Self {
            rules,
            post_processor,
            client,
            store,
            options,
        }
    }

    pub fn client(&self) -> &Arc<dyn HttpClient> {
        &self.client
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    /// Resolves candidates one at a time, in rule-table order.
    ///
    /// Per-candidate failures only drop that candidate. The queue is written once,
    /// and only if something was added.
    pub async fn harvest(&self, page: &Page) -> Result<HarvestReport, HarvestError> {
        let matches = self.rules.collect_candidates(page);
        engine_debug!("{} candidate(s) on {}", matches.len(), page.url);

        let mut queue = self.store.get().await?;
        let mut known: HashSet<String> = queue.iter().cloned().collect();
        let mut added = Vec::new();

        for rule_match in matches {
            let Some(rule) = self.rules.get(rule_match.rule_index) else {
                continue;
            };
            let candidate = rule_match.candidate;
            if candidate.value.trim().is_empty() || known.contains(&candidate.value) {
                continue;
            }

            let resolved = match &rule.resolution {
                None => vec![candidate.value.clone()],
                Some(spec) => {
                    resolve_candidate(self.client.as_ref(), spec, &candidate, &page.url).await
                }
            };

            for link in resolved {
                let link = if self.options.post_process {
                    self.post_processor
                        .process(&link, self.client.as_ref())
                        .await
                } else {
                    link
                };
                if link.trim().is_empty() || !known.insert(link.clone()) {
                    continue;
                }
                engine_debug!("Rule {} queued {}", rule.name, link);
                queue.push(link.clone());
                added.push(link);
            }
        }

        if !added.is_empty() {
            self.store.set(&queue).await?;
        }
        engine_info!(
            "Harvest of {} added {} link(s), queue holds {}",
            page.url,
            added.len(),
            queue.len()
        );

        Ok(HarvestReport { added, queue })
    }
}
