//! `CollectionService` over HTTP, speaking the list/create/update/status/delete contract.

use std::{marker::PhantomData, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use shared::{
    error::DeleteConflictBody,
    protocol::{ListResponse, MessageBody},
    record::{Record, RecordId},
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::CoreError,
    normalize::Payload,
    service::{CollectionService, ListPage, PageQuery},
};

pub struct HttpCollectionService<E> {
    http: Client,
    base_url: Url,
    collection: String,
    _record: PhantomData<fn() -> E>,
}

impl<E> HttpCollectionService<E> {
    pub fn new(
        base_url: &str,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| CoreError::Refused(format!("invalid server url '{base_url}': {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::Refused(format!(
                "server url '{base_url}' cannot carry a path"
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            collection: collection.into(),
            _record: PhantomData,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CoreError::Refused("server url cannot carry a path".into()))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl<E: Record> CollectionService<E> for HttpCollectionService<E> {
    async fn list(&self, query: Option<&PageQuery>) -> Result<ListPage<E>, CoreError> {
        let url = self.endpoint(&[self.collection.as_str()])?;
        let mut request = self.http.get(url);
        if let Some(query) = query {
            let mut params: Vec<(String, String)> = query.filters.clone();
            params.push(("page".into(), query.page.to_string()));
            params.push(("limit".into(), query.limit.to_string()));
            request = request.query(&params);
        }
        let res = accept(request.send().await?).await?;
        let body: ListResponse<E> = res.json().await?;
        let (items, total, page) = body.into_parts();
        debug!(
            collection = %self.collection,
            items = items.len(),
            ?total,
            ?page,
            "http: listed collection"
        );
        Ok(ListPage {
            items,
            total: total.map(|t| t as usize),
            page: page.map(|p| p as usize),
        })
    }

    async fn list_reference(&self, name: &str) -> Result<Vec<Value>, CoreError> {
        let url = self.endpoint(&[name])?;
        let res = accept(self.http.get(url).send().await?).await?;
        let body: ListResponse<Value> = res.json().await?;
        Ok(body.into_parts().0)
    }

    async fn create(&self, payload: &Payload) -> Result<(), CoreError> {
        let url = self.endpoint(&[self.collection.as_str()])?;
        accept(self.http.post(url).json(payload).send().await?).await?;
        Ok(())
    }

    async fn update(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError> {
        let id = id.to_string();
        let url = self.endpoint(&[self.collection.as_str(), id.as_str()])?;
        accept(self.http.patch(url).json(payload).send().await?).await?;
        Ok(())
    }

    async fn update_status(&self, id: &RecordId, payload: &Payload) -> Result<(), CoreError> {
        let id = id.to_string();
        let url = self.endpoint(&[self.collection.as_str(), id.as_str(), "status"])?;
        accept(self.http.patch(url).json(payload).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), CoreError> {
        let id = id.to_string();
        let url = self.endpoint(&[self.collection.as_str(), id.as_str()])?;
        let res = self.http.delete(url).send().await?;
        if res.status().is_success() {
            return Ok(());
        }
        let status = res.status();
        let raw = res.text().await.unwrap_or_default();
        if let Ok(body) = serde_json::from_str::<DeleteConflictBody>(&raw) {
            return Err(CoreError::DeleteConflict {
                message: body.error,
                detail: body.detalhes,
            });
        }
        Err(rejection(status, &raw))
    }
}

async fn accept(res: Response) -> Result<Response, CoreError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let raw = res.text().await.unwrap_or_default();
    Err(rejection(status, &raw))
}

fn rejection(status: StatusCode, raw: &str) -> CoreError {
    let message = match serde_json::from_str::<MessageBody>(raw) {
        Ok(body) => body.message,
        Err(_) => {
            warn!(status = status.as_u16(), "http: rejection without a message body");
            format!("request failed with status {}", status.as_u16())
        }
    };
    CoreError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
