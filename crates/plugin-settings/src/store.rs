use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::{EnablementMap, EntityId, PluginId, SettingsBackend, StoreError};

/// プラグイン有効化状態のストア。
///
/// メモリ上の [`EnablementMap`] を唯一の所有者として保持し、変更のたびに
/// レコード全体をバックエンドへ書き戻す（write-through）。
/// クローンは同じ状態を共有するので、起動時に一つ作って各呼び出し元へ渡す。
///
/// 同時に発行された変更同士の調停は行わない。バックエンド上では最後に
/// 届いた書き込みが勝つ。
#[derive(Clone)]
pub struct PluginEnablementStore {
    backend: Arc<dyn SettingsBackend>,
    state: Arc<watch::Sender<EnablementMap>>,
    loads_in_flight: Arc<AtomicUsize>,
}

impl PluginEnablementStore {
    /// 全プラグイン無効の状態で作成。
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        let (state, _) = watch::channel(EnablementMap::default());
        Self {
            backend,
            state: Arc::new(state),
            loads_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// バックエンドから読み込み、失敗時は全無効に戻してログのみ残す。
    pub async fn load(&self) {
        if let Err(err) = self.try_load().await {
            tracing::warn!("{err}; treating every plugin as disabled");
        }
    }

    /// `load` と同じ状態遷移だが、取得エラーを呼び出し元へ返す。
    pub async fn try_load(&self) -> Result<(), StoreError> {
        let _loading = LoadingGuard::enter(&self.loads_in_flight);

        let (next, result) = match self.backend.fetch().await {
            Ok(map) => (map, Ok(())),
            Err(err) => (EnablementMap::default(), Err(StoreError::Fetch(err))),
        };

        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        result
    }

    /// 読み込み中かどうか。
    pub fn is_loading(&self) -> bool {
        self.loads_in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_enabled(&self, plugin: PluginId, id: EntityId) -> bool {
        self.state.borrow().contains(plugin, id)
    }

    pub fn enabled_count(&self, plugin: PluginId) -> usize {
        self.state.borrow().count(plugin)
    }

    pub fn enabled_ids(&self, plugin: PluginId) -> Vec<EntityId> {
        self.state.borrow().ids(plugin).to_vec()
    }

    /// 現在の状態のコピー。
    pub fn snapshot(&self) -> EnablementMap {
        self.state.borrow().clone()
    }

    /// ローカルの状態が変わるたびに通知を受け取る。
    pub fn subscribe(&self) -> watch::Receiver<EnablementMap> {
        self.state.subscribe()
    }

    /// 有効化。既に有効なら何もしない（書き込みなし）。
    pub async fn enable(&self, plugin: PluginId, id: EntityId) -> Result<(), StoreError> {
        self.update(plugin, Persist::IfChanged, |ids| {
            if !ids.contains(&id) {
                ids.push(id);
            }
        })
        .await
    }

    /// 無効化。有効でなければ何もしない（書き込みなし）。
    pub async fn disable(&self, plugin: PluginId, id: EntityId) -> Result<(), StoreError> {
        self.update(plugin, Persist::IfChanged, |ids| ids.retain(|&x| x != id)).await
    }

    /// 現在の状態を見て `enable` / `disable` を呼ぶだけで、原子的ではない。
    ///
    /// 二回呼ぶと有効/無効は元に戻るが、再有効化した ID は末尾に付くため
    /// 並び順までは戻らない。
    pub async fn toggle(&self, plugin: PluginId, id: EntityId) -> Result<(), StoreError> {
        if self.is_enabled(plugin, id) {
            self.disable(plugin, id).await
        } else {
            self.enable(plugin, id).await
        }
    }

    /// 指定 ID 群を追加（和集合）。
    pub async fn enable_many(
        &self,
        plugin: PluginId,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> Result<(), StoreError> {
        self.update(plugin, Persist::IfChanged, |current| current.extend(ids)).await
    }

    /// 指定 ID 群を取り除く。
    pub async fn disable_many(
        &self,
        plugin: PluginId,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> Result<(), StoreError> {
        let remove: Vec<EntityId> = ids.into_iter().collect();
        self.update(plugin, Persist::IfChanged, |current| {
            current.retain(|id| !remove.contains(id))
        })
        .await
    }

    /// 指定 ID 群で丸ごと置き換える。変化がなくても必ず保存する。
    pub async fn enable_all(
        &self,
        plugin: PluginId,
        ids: impl IntoIterator<Item = EntityId>,
    ) -> Result<(), StoreError> {
        let ids: Vec<EntityId> = ids.into_iter().collect();
        self.update(plugin, Persist::Always, |current| *current = ids).await
    }

    /// 空にする。変化がなくても必ず保存する。
    pub async fn disable_all(&self, plugin: PluginId) -> Result<(), StoreError> {
        self.update(plugin, Persist::Always, |ids| ids.clear()).await
    }

    /// 現在の状態をそのまま保存。
    pub async fn save(&self) -> Result<(), StoreError> {
        let snapshot = self.snapshot();
        self.persist(&snapshot).await
    }

    /// ローカルに適用してから、必要ならレコード全体を書き戻す。
    /// 保存に失敗してもローカルの変更は戻さない。
    async fn update<F>(
        &self,
        plugin: PluginId,
        policy: Persist,
        updater: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<EntityId>),
    {
        let mut to_persist = None;
        self.state.send_if_modified(|map| {
            let changed = map.update(plugin, updater);
            if changed || policy == Persist::Always {
                to_persist = Some(map.clone());
            }
            changed
        });

        match to_persist {
            Some(snapshot) => self.persist(&snapshot).await,
            None => {
                tracing::debug!(%plugin, "enablement unchanged, skipping save");
                Ok(())
            }
        }
    }

    async fn persist(&self, snapshot: &EnablementMap) -> Result<(), StoreError> {
        self.backend.persist(snapshot).await.map_err(|err| {
            let err = StoreError::Persistence(err);
            tracing::error!("{err}");
            err
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Persist {
    IfChanged,
    Always,
}

struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
