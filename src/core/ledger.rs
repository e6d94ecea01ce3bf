//! Titles and ratings, held in memory and mirrored to two JSON documents.
//!
//! Every mutation is written through before it returns. If the write fails
//! before any document was replaced, the in-memory state is put back. A delete
//! that replaced the titles document but not the ratings document keeps the
//! deletion, which matches what the next load sees.

use crate::domain::model::{
    is_valid_score, mean, RatingsDocument, RatingsMap, TitleAverage, TitleRatings, TitleSet,
    TitlesDocument, UserId, UserRating, AUTOCOMPLETE_LIMIT,
};
use crate::domain::ports::Storage;
use crate::utils::error::{LedgerError, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFiles {
    pub titles: String,
    pub ratings: String,
}

impl Default for LedgerFiles {
    fn default() -> Self {
        Self {
            titles: "titles.json".to_string(),
            ratings: "ratings.json".to_string(),
        }
    }
}

pub struct Ledger<S: Storage> {
    storage: S,
    files: LedgerFiles,
    titles: TitleSet,
    ratings: RatingsMap,
}

impl<S: Storage> Ledger<S> {
    /// An empty ledger. Nothing is written until the first mutation.
    pub fn new(storage: S, files: LedgerFiles) -> Self {
        Self {
            storage,
            files,
            titles: TitleSet::new(),
            ratings: RatingsMap::new(),
        }
    }

    /// Loads both documents, treating a missing document as empty.
    pub async fn load(storage: S, files: LedgerFiles) -> Result<Self> {
        let titles_doc: TitlesDocument = read_document(&storage, &files.titles)
            .await?
            .unwrap_or_default();
        let ratings_doc: RatingsDocument = read_document(&storage, &files.ratings)
            .await?
            .unwrap_or_default();

        let titles: TitleSet = titles_doc.into_keys().collect();
        let ratings = sanitize_ratings(&titles, ratings_doc);

        tracing::debug!(
            titles = titles.len(),
            rated_titles = ratings.len(),
            "Loaded ledger"
        );

        Ok(Self {
            storage,
            files,
            titles,
            ratings,
        })
    }

    /// Adds a title. The name is stored exactly as given.
    pub async fn add_title(&mut self, name: &str) -> Result<()> {
        if self.titles.contains(name) {
            return Err(LedgerError::AlreadyExists {
                title: name.to_string(),
            });
        }

        self.titles.insert(name.to_string());
        if let Err(e) = self.save_titles().await {
            self.titles.shift_remove(name);
            return Err(e);
        }

        tracing::info!(title = name, "Added title");
        Ok(())
    }

    /// Removes a title together with all of its ratings.
    pub async fn delete_title(&mut self, name: &str) -> Result<()> {
        let Some(index) = self.titles.get_index_of(name) else {
            return Err(LedgerError::NotFound {
                title: name.to_string(),
            });
        };

        self.titles.shift_remove_index(index);
        let removed = self
            .ratings
            .get_index_of(name)
            .and_then(|i| self.ratings.shift_remove_index(i).map(|entry| (i, entry)));

        if let Err(failure) = self.persist().await {
            if failure.replaced == 0 {
                self.titles.shift_insert(index, name.to_string());
                if let Some((i, (title, scores))) = removed {
                    self.ratings.shift_insert(i, title, scores);
                }
            } else {
                // The titles document no longer lists the title, and the stale
                // ratings entry is dropped on the next load.
                tracing::error!(
                    title = name,
                    error = %failure.error,
                    "Titles document replaced but ratings document was not; keeping the deletion"
                );
            }
            return Err(failure.error);
        }

        tracing::info!(
            title = name,
            ratings = removed.map_or(0, |(_, (_, scores))| scores.len()),
            "Deleted title"
        );
        Ok(())
    }

    pub fn list_titles(&self) -> Vec<String> {
        self.titles.iter().cloned().collect()
    }

    /// Records `user`'s score for `title`, replacing any earlier score.
    /// Returns the replaced score, if there was one.
    pub async fn submit_rating(
        &mut self,
        title: &str,
        user: &str,
        score: f64,
    ) -> Result<Option<f64>> {
        if !self.titles.contains(title) {
            return Err(LedgerError::NotFound {
                title: title.to_string(),
            });
        }
        if !is_valid_score(score) {
            return Err(LedgerError::InvalidRange { score });
        }

        let created = !self.ratings.contains_key(title);
        let previous = self
            .ratings
            .entry(title.to_string())
            .or_default()
            .insert(user.to_string(), score);

        if let Err(e) = self.save_ratings().await {
            if created {
                self.ratings.shift_remove(title);
            } else if let Some(scores) = self.ratings.get_mut(title) {
                match previous {
                    Some(prior) => {
                        scores.insert(user.to_string(), prior);
                    }
                    None => {
                        scores.shift_remove(user);
                    }
                }
            }
            return Err(e);
        }

        tracing::info!(title, user, score, ?previous, "Recorded rating");
        Ok(previous)
    }

    pub fn get_ratings(&self, title: &str) -> Result<TitleRatings> {
        if !self.titles.contains(title) {
            return Err(LedgerError::NotFound {
                title: title.to_string(),
            });
        }

        let ratings: Vec<(UserId, f64)> = self
            .ratings
            .get(title)
            .map(|scores| scores.iter().map(|(u, s)| (u.clone(), *s)).collect())
            .unwrap_or_default();
        let mean = mean(ratings.iter().map(|(_, s)| *s));

        Ok(TitleRatings {
            title: title.to_string(),
            ratings,
            mean,
        })
    }

    /// All of `user`'s ratings, in title order.
    pub fn get_user_ratings(&self, user: &str) -> Vec<UserRating> {
        self.titles
            .iter()
            .filter_map(|title| {
                let score = self.ratings.get(title)?.get(user)?;
                Some(UserRating {
                    title: title.clone(),
                    score: *score,
                })
            })
            .collect()
    }

    /// Highest mean score first. Titles without ratings are left out and
    /// equal means keep title order.
    pub fn top_titles(&self, limit: usize) -> Vec<TitleAverage> {
        let mut averages: Vec<TitleAverage> = self
            .titles
            .iter()
            .filter_map(|title| {
                let mean = mean(self.ratings.get(title)?.values().copied())?;
                Some(TitleAverage {
                    title: title.clone(),
                    mean,
                })
            })
            .collect();

        averages.sort_by(|a, b| b.mean.total_cmp(&a.mean));
        averages.truncate(limit);
        averages
    }

    /// Case-insensitive substring match over title names, capped for autocomplete.
    pub fn search_titles(&self, substring: &str) -> Vec<String> {
        let needle = substring.to_lowercase();
        self.titles
            .iter()
            .filter(|title| title.to_lowercase().contains(&needle))
            .take(AUTOCOMPLETE_LIMIT)
            .cloned()
            .collect()
    }

    /// Writes both documents. Both are staged before either is replaced.
    async fn persist(&self) -> std::result::Result<(), CommitFailure> {
        let titles = self.encode_titles().map_err(CommitFailure::untouched)?;
        let ratings = self.encode_ratings().map_err(CommitFailure::untouched)?;
        self.commit(&[
            (self.files.titles.as_str(), titles),
            (self.files.ratings.as_str(), ratings),
        ])
        .await
    }

    async fn save_titles(&self) -> Result<()> {
        let titles = self.encode_titles()?;
        self.commit(&[(self.files.titles.as_str(), titles)])
            .await
            .map_err(|f| f.error)
    }

    async fn save_ratings(&self) -> Result<()> {
        let ratings = self.encode_ratings()?;
        self.commit(&[(self.files.ratings.as_str(), ratings)])
            .await
            .map_err(|f| f.error)
    }

    fn encode_titles(&self) -> Result<Vec<u8>> {
        let document: IndexMap<&str, bool> =
            self.titles.iter().map(|t| (t.as_str(), true)).collect();
        to_pretty_json(&document).map_err(|e| LedgerError::persistence(&self.files.titles, e))
    }

    fn encode_ratings(&self) -> Result<Vec<u8>> {
        to_pretty_json(&self.ratings).map_err(|e| LedgerError::persistence(&self.files.ratings, e))
    }

    async fn commit(&self, documents: &[(&str, Vec<u8>)]) -> std::result::Result<(), CommitFailure> {
        let mut staged: Vec<(String, &str)> = Vec::with_capacity(documents.len());

        for (document, bytes) in documents {
            let temp = temp_name(document);
            if let Err(e) = self.storage.write_file(&temp, bytes).await {
                staged.push((temp, *document));
                self.discard(&staged).await;
                return Err(CommitFailure::untouched(storage_error(document, e)));
            }
            staged.push((temp, *document));
        }

        for (i, (temp, document)) in staged.iter().enumerate() {
            if let Err(e) = self.storage.rename(temp, document).await {
                self.discard(&staged[i..]).await;
                return Err(CommitFailure {
                    replaced: i,
                    error: storage_error(document, e),
                });
            }
        }

        Ok(())
    }

    async fn discard(&self, staged: &[(String, &str)]) {
        for (temp, _) in staged {
            if let Err(e) = self.storage.remove_file(temp).await {
                tracing::warn!(file = %temp, error = %e, "Could not remove staged document");
            }
        }
    }
}

/// A failed commit and how many documents it had already replaced.
struct CommitFailure {
    replaced: usize,
    error: LedgerError,
}

impl CommitFailure {
    fn untouched(error: LedgerError) -> Self {
        Self { replaced: 0, error }
    }
}

fn temp_name(document: &str) -> String {
    format!("{}.tmp", document)
}

/// Attaches the document name to raw storage errors.
fn storage_error(document: &str, err: LedgerError) -> LedgerError {
    match err {
        LedgerError::IoError(e) => LedgerError::persistence(document, e),
        LedgerError::SerializationError(e) => LedgerError::persistence(document, e),
        other => other,
    }
}

async fn read_document<S: Storage, T: DeserializeOwned>(
    storage: &S,
    document: &str,
) -> Result<Option<T>> {
    if !storage
        .exists(document)
        .await
        .map_err(|e| storage_error(document, e))?
    {
        tracing::debug!(document, "Document missing, starting empty");
        return Ok(None);
    }

    let bytes = storage
        .read_file(document)
        .await
        .map_err(|e| storage_error(document, e))?;
    let value = serde_json::from_slice(&bytes).map_err(|e| LedgerError::persistence(document, e))?;
    Ok(Some(value))
}

fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

/// Drops ratings for unknown titles and out-of-range scores.
fn sanitize_ratings(titles: &TitleSet, document: RatingsDocument) -> RatingsMap {
    let mut ratings = RatingsMap::with_capacity(document.len());

    for (title, scores) in document {
        if !titles.contains(&title) {
            tracing::warn!(title = %title, "Dropping ratings for unknown title");
            continue;
        }

        let scores: IndexMap<UserId, f64> = scores
            .into_iter()
            .filter(|(user, score)| {
                let valid = is_valid_score(*score);
                if !valid {
                    tracing::warn!(title = %title, user = %user, score, "Dropping out-of-range score");
                }
                valid
            })
            .collect();
        ratings.insert(title, scores);
    }

    ratings
}
