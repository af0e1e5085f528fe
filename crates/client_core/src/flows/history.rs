//! Paginated, searchable listing of the client's past cases with on-demand detail.

use shared::{
    domain::{CaseDetail, CaseId, CaseList, CaseSummary, ClientIdentity, ListQuery, PAGE_SIZE},
    error::{ApiError, ClientError},
};
use tracing::{debug, info, warn};

use super::{FlowError, FlowId, Ticket, TicketCounter};
use crate::{api, gateway::Gateway, notice::describe_failure};

#[derive(Debug, Clone)]
pub struct PendingList {
    ticket: Ticket,
    identity: ClientIdentity,
    query: ListQuery,
}

impl PendingList {
    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PendingCase {
    ticket: Ticket,
    id: CaseId,
}

impl PendingCase {
    pub fn id(&self) -> CaseId {
        self.id
    }
}

pub struct HistoryFlow {
    id: FlowId,
    tickets: TicketCounter,
    identity: Option<ClientIdentity>,
    cases: Vec<CaseSummary>,
    total: u64,
    pages: Option<u32>,
    current_page: u32,
    keyword: Option<String>,
    loaded: bool,
    list_in_flight: Option<Ticket>,
    detail_in_flight: Option<Ticket>,
    like_in_flight: Option<Ticket>,
    detail: Option<CaseDetail>,
    last_error: Option<String>,
}

impl HistoryFlow {
    pub fn new(id: FlowId, identity: Option<ClientIdentity>) -> Self {
        Self {
            id,
            tickets: TicketCounter::default(),
            identity,
            cases: Vec::new(),
            total: 0,
            pages: None,
            current_page: 1,
            keyword: None,
            loaded: false,
            list_in_flight: None,
            detail_in_flight: None,
            like_in_flight: None,
            detail: None,
            last_error: None,
        }
    }

    pub fn id(&self) -> FlowId {
        self.id
    }

    pub fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    pub fn cases(&self) -> &[CaseSummary] {
        &self.cases
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_list_loading(&self) -> bool {
        self.list_in_flight.is_some()
    }

    pub fn is_detail_loading(&self) -> bool {
        self.detail_in_flight.is_some()
    }

    pub fn detail(&self) -> Option<&CaseDetail> {
        self.detail.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn begin_load(&mut self, page: u32, keyword: Option<&str>) -> Result<PendingList, FlowError> {
        let query = ListQuery::new(page, keyword).ok_or(FlowError::InvalidPage)?;
        self.begin_list(query)
    }

    /// Any search, even for the keyword already shown, restarts at page 1.
    pub fn begin_search(&mut self, keyword: &str) -> Result<PendingList, FlowError> {
        self.begin_load(1, Some(keyword))
    }

    /// Keeps the keyword of the list currently shown.
    pub fn begin_page(&mut self, page: u32) -> Result<PendingList, FlowError> {
        let keyword = self.keyword.clone();
        self.begin_load(page, keyword.as_deref())
    }

    pub fn begin_refresh(&mut self) -> Result<PendingList, FlowError> {
        self.begin_page(self.current_page)
    }

    fn begin_list(&mut self, query: ListQuery) -> Result<PendingList, FlowError> {
        let identity = self
            .identity
            .clone()
            .ok_or(FlowError::Client(ClientError::MissingIdentity))?;
        if self.list_in_flight.is_some() {
            debug!(flow = self.id.0, "list load ignored while another is in flight");
            return Err(FlowError::Busy);
        }

        let ticket = self.tickets.issue(self.id);
        self.list_in_flight = Some(ticket);
        debug!(
            flow = self.id.0,
            page = query.page(),
            keyword = query.keyword().unwrap_or(""),
            "loading case history"
        );
        Ok(PendingList {
            ticket,
            identity,
            query,
        })
    }

    /// On failure the displayed list, total, page and keyword stay as they were.
    pub fn complete_list(
        &mut self,
        pending: PendingList,
        result: Result<CaseList, ApiError>,
    ) -> Result<(), ClientError> {
        if self.list_in_flight != Some(pending.ticket) {
            debug!(flow = self.id.0, "dropping stale list result");
            return Ok(());
        }
        self.list_in_flight = None;

        match result {
            Ok(list) => {
                info!(
                    flow = self.id.0,
                    page = pending.query.page(),
                    returned = list.cases.len(),
                    total = list.total,
                    "case history loaded"
                );
                self.cases = list.cases;
                self.total = list.total;
                self.pages = list.pages;
                self.current_page = pending.query.page();
                self.keyword = pending.query.keyword().map(str::to_string);
                self.loaded = true;
                self.last_error = None;
                Ok(())
            }
            Err(err) => Err(self.record_failure(err, "case history load failed")),
        }
    }

    pub fn begin_detail(&mut self, id: CaseId) -> Result<PendingCase, FlowError> {
        if self.detail_in_flight.is_some() {
            return Err(FlowError::Busy);
        }
        let ticket = self.tickets.issue(self.id);
        self.detail_in_flight = Some(ticket);
        Ok(PendingCase { ticket, id })
    }

    /// Opens the detail view on success. The list is never touched here
    /// beyond refreshing the view count the backend just bumped.
    pub fn complete_detail(
        &mut self,
        pending: PendingCase,
        result: Result<CaseDetail, ApiError>,
    ) -> Result<(), ClientError> {
        if self.detail_in_flight != Some(pending.ticket) {
            debug!(flow = self.id.0, case_id = %pending.id, "dropping stale detail result");
            return Ok(());
        }
        self.detail_in_flight = None;

        match result {
            Ok(detail) => {
                if let Some(summary) = self.summary_mut(pending.id) {
                    summary.view_count = detail.summary.view_count;
                }
                self.detail = Some(detail);
                self.last_error = None;
                Ok(())
            }
            Err(err) => Err(self.record_failure(err, "case detail load failed")),
        }
    }

    pub fn begin_like(&mut self, id: CaseId) -> Result<PendingCase, FlowError> {
        if self.like_in_flight.is_some() {
            return Err(FlowError::Busy);
        }
        let ticket = self.tickets.issue(self.id);
        self.like_in_flight = Some(ticket);
        Ok(PendingCase { ticket, id })
    }

    pub fn complete_like(
        &mut self,
        pending: PendingCase,
        result: Result<u64, ApiError>,
    ) -> Result<(), ClientError> {
        if self.like_in_flight != Some(pending.ticket) {
            return Ok(());
        }
        self.like_in_flight = None;

        match result {
            Ok(like_count) => {
                if let Some(summary) = self.summary_mut(pending.id) {
                    summary.like_count = like_count;
                }
                if let Some(detail) = self.detail.as_mut().filter(|d| d.summary.id == pending.id) {
                    detail.summary.like_count = like_count;
                }
                Ok(())
            }
            Err(err) => Err(self.record_failure(err, "case like failed")),
        }
    }

    pub async fn load_page(
        &mut self,
        gateway: &dyn Gateway,
        page: u32,
        keyword: Option<&str>,
    ) -> Result<(), FlowError> {
        let pending = self.begin_load(page, keyword)?;
        self.run_list(gateway, pending).await
    }

    pub async fn search(&mut self, gateway: &dyn Gateway, keyword: &str) -> Result<(), FlowError> {
        let pending = self.begin_search(keyword)?;
        self.run_list(gateway, pending).await
    }

    pub async fn change_page(&mut self, gateway: &dyn Gateway, page: u32) -> Result<(), FlowError> {
        let pending = self.begin_page(page)?;
        self.run_list(gateway, pending).await
    }

    pub async fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), FlowError> {
        let pending = self.begin_refresh()?;
        self.run_list(gateway, pending).await
    }

    pub async fn load_detail(&mut self, gateway: &dyn Gateway, id: CaseId) -> Result<(), FlowError> {
        let pending = self.begin_detail(id)?;
        let result = api::get_case(gateway, id).await;
        Ok(self.complete_detail(pending, result)?)
    }

    pub async fn like(&mut self, gateway: &dyn Gateway, id: CaseId) -> Result<(), FlowError> {
        let pending = self.begin_like(id)?;
        let result = api::like_case(gateway, id).await;
        Ok(self.complete_like(pending, result)?)
    }

    async fn run_list(&mut self, gateway: &dyn Gateway, pending: PendingList) -> Result<(), FlowError> {
        let result = api::list_user_cases(gateway, pending.identity(), pending.query()).await;
        Ok(self.complete_list(pending, result)?)
    }

    pub fn total_pages(&self) -> u32 {
        if let Some(pages) = self.pages {
            return pages;
        }
        let pages = self.total.div_ceil(u64::from(PAGE_SIZE));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn show_pagination(&self) -> bool {
        self.total > u64::from(PAGE_SIZE)
    }

    /// `"11-20 of 42"` for the page currently shown.
    pub fn range_label(&self) -> String {
        if self.cases.is_empty() {
            return format!("0 of {}", self.total);
        }
        let start = u64::from(self.current_page - 1) * u64::from(PAGE_SIZE) + 1;
        let end = start + self.cases.len() as u64 - 1;
        format!("{start}-{end} of {}", self.total)
    }

    pub fn empty_message(&self) -> String {
        match self.keyword.as_deref() {
            Some(keyword) => format!("No cases found matching \"{keyword}\"."),
            None => "No history yet; create your first case.".to_string(),
        }
    }

    fn summary_mut(&mut self, id: CaseId) -> Option<&mut CaseSummary> {
        self.cases.iter_mut().find(|summary| summary.id == id)
    }

    fn record_failure(&mut self, err: ApiError, context: &'static str) -> ClientError {
        let err = ClientError::from(err);
        warn!(flow = self.id.0, error = %err, "{context}");
        self.last_error = Some(describe_failure(&err));
        err
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
