// ── Central reactive data store ──
//
// Holds every piece of dashboard state. Push handlers and pollers only
// call the merge operations below; nothing else writes to the collections.
// Mutations are broadcast to subscribers via `watch` channels.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use tokio::sync::watch;
use tracing::debug;

use super::collection::EntityCollection;
use super::log::BoundedLog;
use crate::config::StoreLimits;
use crate::model::{
    AlertDraft, AlertId, CurrentTraffic, Device, DeviceId, DeviceUpdate, Event, EventDraft,
    EventId, NetworkStats, SecurityAlert, SystemHealth, TrafficSample, TrafficWindow,
};
use crate::stream::EntityStream;

/// Result of merging one device update.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// No existing record matched; a new one was created.
    Inserted(Arc<Device>),
    /// Merged into an existing record.
    Updated(Arc<Device>),
    /// Nothing matched and the update had no address to create a record from.
    Rejected,
}

impl MergeOutcome {
    pub fn device(&self) -> Option<&Arc<Device>> {
        match self {
            Self::Inserted(d) | Self::Updated(d) => Some(d),
            Self::Rejected => None,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

fn id_key(id: &DeviceId) -> String {
    format!("id:{id}")
}

fn device_key(device: &Device) -> String {
    match &device.id {
        Some(id) => id_key(id),
        None => format!("addr:{}", device.address),
    }
}

fn device_order(a: &Device, b: &Device) -> std::cmp::Ordering {
    a.address.cmp(&b.address).then_with(|| a.id.cmp(&b.id))
}

/// Reactive storage for everything the dashboard shows.
///
/// Constructed once per controller and shared by `Arc`. Device merges are
/// serialized by an internal lock that is never held across an await.
pub struct DataStore {
    limits: StoreLimits,

    pub(crate) devices: EntityCollection<Device>,
    pub(crate) events: BoundedLog<Event>,
    pub(crate) alerts: BoundedLog<SecurityAlert>,

    traffic: watch::Sender<TrafficWindow>,
    current_traffic: watch::Sender<Option<CurrentTraffic>>,
    network_stats: watch::Sender<Option<NetworkStats>>,
    system_health: watch::Sender<Option<SystemHealth>>,

    selected: DashSet<DeviceId>,
    merge_lock: Mutex<()>,
    next_local_id: AtomicU64,

    last_data_update: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new(limits: StoreLimits) -> Self {
        let (traffic, _) = watch::channel(TrafficWindow::new(limits.traffic_window));
        let (current_traffic, _) = watch::channel(None);
        let (network_stats, _) = watch::channel(None);
        let (system_health, _) = watch::channel(None);
        let (last_data_update, _) = watch::channel(None);

        Self {
            limits,
            devices: EntityCollection::new(device_order),
            events: BoundedLog::new(limits.max_events),
            alerts: BoundedLog::new(limits.max_alerts),
            traffic,
            current_traffic,
            network_stats,
            system_health,
            selected: DashSet::new(),
            merge_lock: Mutex::new(()),
            next_local_id: AtomicU64::new(1),
            last_data_update,
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    // ── Device merges ────────────────────────────────────────────────

    /// Merge one partial device record.
    ///
    /// Matches by id first, then by address when either side lacks an id.
    /// Present fields overwrite; absent fields keep their stored value.
    pub fn upsert_device(&self, update: DeviceUpdate) -> MergeOutcome {
        let _guard = self.lock_merges();
        let outcome = self.merge_locked(update);
        if !matches!(outcome, MergeOutcome::Rejected) {
            self.touch();
        }
        outcome
    }

    /// Merge like [`upsert_device`](Self::upsert_device), but when the
    /// update matches no stored record, fill its absent fields from
    /// `defaults` before inserting. Defaults never touch an existing record.
    pub fn upsert_device_or_insert_with(
        &self,
        mut update: DeviceUpdate,
        defaults: DeviceUpdate,
    ) -> MergeOutcome {
        let _guard = self.lock_merges();
        if self.find_match(&update).is_none() {
            update.fill_missing(defaults);
        }
        let outcome = self.merge_locked(update);
        if !matches!(outcome, MergeOutcome::Rejected) {
            self.touch();
        }
        outcome
    }

    /// Apply a full device listing: merge every entry, then drop devices
    /// the listing no longer contains. Selection survives for devices that
    /// remain.
    pub fn apply_device_listing(&self, updates: Vec<DeviceUpdate>) {
        let _guard = self.lock_merges();

        let keep: HashSet<String> = updates
            .into_iter()
            .filter_map(|u| self.merge_locked(u).device().map(|d| device_key(d)))
            .collect();

        for removed in self.devices.retain_keys(&keep) {
            if let Some(id) = &removed.id {
                self.selected.remove(id);
            }
            debug!(address = %removed.address, "device no longer listed; pruned");
        }
        self.touch();
    }

    /// Remove a device by id, dropping it from the selection too.
    pub fn remove_device(&self, id: &DeviceId) -> Option<Arc<Device>> {
        let _guard = self.lock_merges();
        self.selected.remove(id);
        let removed = self.devices.remove(&id_key(id));
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    fn merge_locked(&self, update: DeviceUpdate) -> MergeOutcome {
        if let Some((old_key, current)) = self.find_match(&update) {
            let mut device = Device::clone(&current);
            update.apply_to(&mut device);
            let key = device_key(&device);
            let alias = Some(device.address.clone());
            self.devices.rekey(&old_key, key.clone(), alias, device);
            return self
                .devices
                .get_by_key(&key)
                .map_or(MergeOutcome::Rejected, MergeOutcome::Updated);
        }

        let Some(device) = update.into_device() else {
            debug!("device update matched nothing and has no address; dropped");
            return MergeOutcome::Rejected;
        };
        let key = device_key(&device);
        let alias = Some(device.address.clone());
        self.devices.upsert(key.clone(), alias, device);
        self.devices
            .get_by_key(&key)
            .map_or(MergeOutcome::Rejected, MergeOutcome::Inserted)
    }

    fn find_match(&self, update: &DeviceUpdate) -> Option<(String, Arc<Device>)> {
        if let Some(id) = &update.id {
            let key = id_key(id);
            if let Some(device) = self.devices.get_by_key(&key) {
                return Some((key, device));
            }
        }

        let address = update.address.as_deref()?;
        let key = self.devices.key_for_alias(address)?;
        let candidate = self.devices.get_by_key(&key)?;
        (update.id.is_none() || candidate.id.is_none()).then_some((key, candidate))
    }

    fn lock_merges(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.merge_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Events & alerts ──────────────────────────────────────────────

    pub fn append_event(&self, draft: EventDraft) -> EventId {
        let event = self.finish_event(draft);
        let id = event.id.clone();
        self.events.prepend(vec![event]);
        self.touch();
        id
    }

    /// Prepend a newest-first batch ahead of the existing log.
    pub fn append_events(&self, drafts: Vec<EventDraft>) {
        if drafts.is_empty() {
            return;
        }
        let batch = drafts.into_iter().map(|d| self.finish_event(d)).collect();
        self.events.prepend(batch);
        self.touch();
    }

    pub fn replace_events(&self, drafts: Vec<EventDraft>) {
        let events = drafts.into_iter().map(|d| self.finish_event(d)).collect();
        self.events.replace(events);
        self.touch();
    }

    pub fn append_alert(&self, mut draft: AlertDraft) -> AlertId {
        let id = draft
            .id
            .take()
            .unwrap_or_else(|| AlertId::new(self.next_local_id()));
        self.alerts.prepend(vec![draft.finish(id.clone())]);
        self.touch();
        id
    }

    pub fn replace_alerts(&self, drafts: Vec<AlertDraft>) {
        let alerts = drafts
            .into_iter()
            .map(|mut d| {
                let id = d.id.take().unwrap_or_else(|| AlertId::new(self.next_local_id()));
                d.finish(id)
            })
            .collect();
        self.alerts.replace(alerts);
        self.touch();
    }

    /// Mark an alert acknowledged in place. Returns `false` if the alert is
    /// not in the log.
    pub fn acknowledge_alert(&self, id: &AlertId) -> bool {
        let updated = self.alerts.modify_first(
            |a| a.id == *id,
            |a| SecurityAlert {
                acknowledged: true,
                ..a.clone()
            },
        );
        updated.is_some()
    }

    fn finish_event(&self, mut draft: EventDraft) -> Event {
        let id = draft
            .id
            .take()
            .unwrap_or_else(|| EventId::new(self.next_local_id()));
        draft.finish(id)
    }

    fn next_local_id(&self) -> String {
        format!("local-{}", self.next_local_id.fetch_add(1, Ordering::Relaxed))
    }

    // ── Traffic & metrics ────────────────────────────────────────────

    pub fn push_traffic_sample(&self, sample: TrafficSample) {
        self.traffic.send_modify(|window| window.push(sample));
        self.touch();
    }

    /// Load a historical series (oldest first).
    pub fn replace_traffic_history(&self, samples: Vec<TrafficSample>) {
        self.traffic.send_modify(|window| window.replace(samples));
        self.touch();
    }

    pub fn apply_current_traffic(&self, current: CurrentTraffic) {
        self.current_traffic.send_modify(|c| *c = Some(current));
        self.touch();
    }

    pub fn apply_network_stats(&self, stats: NetworkStats) {
        self.network_stats.send_modify(|s| *s = Some(stats));
        self.touch();
    }

    pub fn apply_system_health(&self, health: SystemHealth) {
        self.system_health.send_modify(|h| *h = Some(health));
        self.touch();
    }

    /// Bump the active alert counter after a pushed alert.
    pub fn increment_active_alerts(&self) {
        self.network_stats.send_modify(|s| {
            s.get_or_insert_with(NetworkStats::default).alerts_active += 1.0;
        });
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Returns `false` if the device is unknown.
    pub fn select_device(&self, id: &DeviceId) -> bool {
        if self.devices.get_by_key(&id_key(id)).is_none() {
            return false;
        }
        self.selected.insert(id.clone());
        true
    }

    pub fn deselect_device(&self, id: &DeviceId) -> bool {
        self.selected.remove(id).is_some()
    }

    pub fn selected_devices(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.selected.iter().map(|r| r.key().clone()).collect();
        ids.sort();
        ids
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn events_snapshot(&self) -> Arc<Vec<Arc<Event>>> {
        self.events.snapshot()
    }

    pub fn alerts_snapshot(&self) -> Arc<Vec<Arc<SecurityAlert>>> {
        self.alerts.snapshot()
    }

    pub fn traffic(&self) -> TrafficWindow {
        self.traffic.borrow().clone()
    }

    pub fn current_traffic(&self) -> Option<CurrentTraffic> {
        *self.current_traffic.borrow()
    }

    pub fn network_stats(&self) -> Option<NetworkStats> {
        *self.network_stats.borrow()
    }

    pub fn system_health(&self) -> Option<SystemHealth> {
        *self.system_health.borrow()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn device_by_id(&self, id: &DeviceId) -> Option<Arc<Device>> {
        self.devices.get_by_key(&id_key(id))
    }

    pub fn device_by_address(&self, address: &str) -> Option<Arc<Device>> {
        self.devices.get_by_alias(address)
    }

    pub fn alert_by_id(&self, id: &AlertId) -> Option<Arc<SecurityAlert>> {
        self.alerts.find(|a| a.id == *id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    pub fn subscribe_events(&self) -> EntityStream<Event> {
        EntityStream::new(self.events.subscribe())
    }

    pub fn subscribe_alerts(&self) -> EntityStream<SecurityAlert> {
        EntityStream::new(self.alerts.subscribe())
    }

    pub fn subscribe_traffic(&self) -> watch::Receiver<TrafficWindow> {
        self.traffic.subscribe()
    }

    pub fn subscribe_network_stats(&self) -> watch::Receiver<Option<NetworkStats>> {
        self.network_stats.subscribe()
    }

    pub fn subscribe_system_health(&self) -> watch::Receiver<Option<SystemHealth>> {
        self.system_health.subscribe()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    /// When any merge last changed the store.
    pub fn last_data_update(&self) -> Option<DateTime<Utc>> {
        *self.last_data_update.borrow()
    }

    /// Time since the last merge, or `None` before the first one.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_data_update().map(|t| Utc::now() - t)
    }

    fn touch(&self) {
        self.last_data_update.send_modify(|t| *t = Some(Utc::now()));
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}
