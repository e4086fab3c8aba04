use std::num::NonZeroU32;

use super::{PreviewBackend, PreviewSource, SessionId, SessionResources, SurfaceSize};

/// 稼働中のセッション
struct ActiveSession<S> {
    id: SessionId,
    session: S,
}

/// プレビューセッションのライフサイクル管理
///
/// 表示領域がマウントされ、かつメッシュ形式のファイルが選択されている間だけ
/// セッションが1つ存在する。ファイル変更・アンマウントで必ず先に破棄してから
/// 次のセッションを構築するため、描画ループが同時に2つ動くことはない。
pub struct LifecycleManager<B: PreviewBackend> {
    backend: B,
    /// 表示インスタンス番号
    instance: u32,
    /// 次に割り当てる世代番号
    next_generation: NonZeroU32,
    surface: Option<SurfaceSize>,
    source: Option<B::Source>,
    active: Option<ActiveSession<B::Session>>,
}

impl<B: PreviewBackend> LifecycleManager<B> {
    /// 新しいLifecycleManagerを作成
    pub fn new(backend: B) -> Self {
        Self::with_instance(backend, 0)
    }

    /// 表示インスタンス番号を指定して作成
    pub fn with_instance(backend: B, instance: u32) -> Self {
        Self {
            backend,
            instance,
            next_generation: NonZeroU32::MIN,
            surface: None,
            source: None,
            active: None,
        }
    }

    /// 表示領域をマウント
    /// ファイルが選択済みならセッションを構築してIDを返す
    pub fn mount(&mut self, surface: SurfaceSize) -> Option<SessionId> {
        log::debug!("Surface mounted ({})", surface);
        self.surface = Some(surface);
        self.rebuild()
    }

    /// 表示領域をアンマウント（セッションも破棄）
    pub fn unmount(&mut self) {
        log::debug!("Surface unmounted");
        self.teardown();
        self.surface = None;
    }

    /// 選択ファイルを変更
    /// 同じファイルの再選択も変更として扱い、セッションを作り直す
    pub fn set_file(&mut self, source: Option<B::Source>) -> Option<SessionId> {
        match &source {
            Some(s) => log::debug!("File selected: {} ({})", s.name(), s.format()),
            None => log::debug!("File cleared"),
        }
        self.source = source;
        self.rebuild()
    }

    /// 表示領域のサイズ変更
    /// サイズ0とアンマウント中は無視する。
    /// サイズ0でマウントされていた場合はここでセッションを構築してIDを返す
    pub fn resize(&mut self, size: SurfaceSize) -> Option<SessionId> {
        if size.validate().is_err() || self.surface.is_none() {
            return None;
        }
        self.surface = Some(size);
        match self.active.as_mut() {
            Some(active) => {
                active.session.resize(size);
                None
            }
            None => self.rebuild(),
        }
    }

    /// 稼働中のセッションを破棄
    /// セッションがなければ何もしない（falseを返す）
    pub fn teardown(&mut self) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        let session = &mut active.session;
        session.stop_loop();
        session.remove_listeners();
        session.detach_surface();
        session.release();

        log::debug!("Session {} torn down", active.id);
        true
    }

    /// IDが稼働中のセッションを指しているか
    pub fn is_current(&self, id: SessionId) -> bool {
        self.active.as_ref().is_some_and(|a| a.id == id)
    }

    /// 稼働中セッションのIDを取得
    pub fn active_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.id)
    }

    /// 稼働中のセッションを取得
    pub fn session(&self) -> Option<&B::Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// 稼働中のセッションを取得（可変参照）
    pub fn session_mut(&mut self) -> Option<&mut B::Session> {
        self.active.as_mut().map(|a| &mut a.session)
    }

    /// 非同期処理の完了をセッションに届ける
    /// IDが既に破棄されたセッションのものなら `f` を呼ばずに None を返す
    pub fn deliver<R>(&mut self, id: SessionId, f: impl FnOnce(&mut B::Session) -> R) -> Option<R> {
        match self.active.as_mut() {
            Some(active) if active.id == id => Some(f(&mut active.session)),
            _ => {
                log::warn!("Discarding completion for stale session {}", id);
                None
            }
        }
    }

    /// 選択中のファイルを取得
    pub fn source(&self) -> Option<&B::Source> {
        self.source.as_ref()
    }

    /// 現在の表示領域サイズを取得
    pub fn surface(&self) -> Option<SurfaceSize> {
        self.surface
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 既存セッションを破棄し、条件が揃っていれば新しいセッションを構築
    fn rebuild(&mut self) -> Option<SessionId> {
        self.teardown();

        let Some(surface) = self.surface else {
            return None;
        };
        if let Err(e) = surface.validate() {
            log::warn!("Preview skipped: {}", e);
            return None;
        }
        let source = self.source.as_ref()?;
        if !source.format().is_mesh() {
            log::debug!("{} is not a mesh; no preview session", source.name());
            return None;
        }

        let id = SessionId::new(self.instance, self.next_generation);
        self.next_generation = self.next_generation.saturating_add(1);

        match self.backend.create_session(id, source, surface) {
            Ok(session) => {
                log::info!("Session {} created for {} ({})", id, source.name(), surface);
                self.active = Some(ActiveSession { id, session });
                Some(id)
            }
            Err(e) => {
                log::warn!("Failed to create preview session for {}: {}", source.name(), e);
                None
            }
        }
    }
}

impl<B: PreviewBackend> Drop for LifecycleManager<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileFormat, SourceFile};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// 呼び出し履歴と同時稼働ループ数を記録するテスト用バックエンド
    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<String>>,
        running_loops: Cell<i32>,
        max_running_loops: Cell<i32>,
    }

    impl Recorder {
        fn push(&self, event: String) {
            self.events.borrow_mut().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }
    }

    struct TestSession {
        id: SessionId,
        recorder: Rc<Recorder>,
        meshes: Vec<String>,
        loop_running: bool,
    }

    impl SessionResources for TestSession {
        fn stop_loop(&mut self) {
            if self.loop_running {
                self.loop_running = false;
                self.recorder.running_loops.set(self.recorder.running_loops.get() - 1);
            }
            self.recorder.push(format!("stop_loop {}", self.id.generation()));
        }

        fn remove_listeners(&mut self) {
            self.recorder.push(format!("remove_listeners {}", self.id.generation()));
        }

        fn detach_surface(&mut self) {
            self.recorder.push(format!("detach_surface {}", self.id.generation()));
        }

        fn release(&mut self) {
            self.meshes.clear();
            self.recorder.push(format!("release {}", self.id.generation()));
        }

        fn resize(&mut self, size: SurfaceSize) {
            self.recorder.push(format!("resize {} {}", self.id.generation(), size));
        }
    }

    struct TestBackend {
        recorder: Rc<Recorder>,
        fail: bool,
    }

    impl PreviewBackend for TestBackend {
        type Source = SourceFile;
        type Session = TestSession;
        type Error = String;

        fn create_session(
            &mut self,
            id: SessionId,
            _source: &SourceFile,
            _surface: SurfaceSize,
        ) -> Result<TestSession, String> {
            if self.fail {
                return Err("no adapter".to_string());
            }
            let running = self.recorder.running_loops.get() + 1;
            self.recorder.running_loops.set(running);
            self.recorder
                .max_running_loops
                .set(self.recorder.max_running_loops.get().max(running));
            self.recorder.push(format!("start {}", id.generation()));
            Ok(TestSession {
                id,
                recorder: self.recorder.clone(),
                meshes: Vec::new(),
                loop_running: true,
            })
        }
    }

    fn manager() -> (LifecycleManager<TestBackend>, Rc<Recorder>) {
        let recorder = Rc::new(Recorder::default());
        let backend = TestBackend {
            recorder: recorder.clone(),
            fail: false,
        };
        (LifecycleManager::new(backend), recorder)
    }

    fn stl(name: &str) -> SourceFile {
        SourceFile::new(name, FileFormat::Stl, Vec::new())
    }

    #[test]
    fn test_no_session_without_surface() {
        let (mut lifecycle, recorder) = manager();
        assert_eq!(lifecycle.set_file(Some(stl("a.stl"))), None);
        assert!(recorder.events().is_empty());

        let id = lifecycle.mount(SurfaceSize::new(640, 480));
        assert!(id.is_some());
        assert_eq!(lifecycle.active_id(), id);
    }

    #[test]
    fn test_no_session_without_file() {
        let (mut lifecycle, recorder) = manager();
        assert_eq!(lifecycle.mount(SurfaceSize::new(640, 480)), None);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_zero_sized_surface_skips_construction() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(0, 200));
        assert_eq!(lifecycle.set_file(Some(stl("a.stl"))), None);
        assert!(lifecycle.session().is_none());
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_resize_from_zero_builds_session() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(0, 0));
        assert_eq!(lifecycle.set_file(Some(stl("a.stl"))), None);

        let id = lifecycle.resize(SurfaceSize::new(640, 480));
        assert!(id.is_some());
        assert_eq!(lifecycle.active_id(), id);
        assert_eq!(recorder.events(), vec!["start 1".to_string()]);

        // 以降のリサイズは既存セッションへ転送
        assert_eq!(lifecycle.resize(SurfaceSize::new(800, 600)), None);
        assert_eq!(lifecycle.active_id(), id);
        assert_eq!(recorder.max_running_loops.get(), 1);
    }

    #[test]
    fn test_resize_while_unmounted_is_ignored() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.set_file(Some(stl("a.stl")));
        assert_eq!(lifecycle.resize(SurfaceSize::new(640, 480)), None);
        assert_eq!(lifecycle.surface(), None);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_image_file_gets_no_session() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        let png = SourceFile::new("photo.png", FileFormat::Png, Vec::new());
        assert_eq!(lifecycle.set_file(Some(png)), None);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn test_teardown_order() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        lifecycle.set_file(Some(stl("a.stl")));
        assert!(lifecycle.teardown());

        assert_eq!(
            recorder.events(),
            vec!["start 1", "stop_loop 1", "remove_listeners 1", "detach_surface 1", "release 1"]
        );
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let (mut lifecycle, recorder) = manager();
        assert!(!lifecycle.teardown());

        lifecycle.mount(SurfaceSize::new(640, 480));
        lifecycle.set_file(Some(stl("a.stl")));
        assert!(lifecycle.teardown());
        assert!(!lifecycle.teardown());
        assert_eq!(recorder.events().iter().filter(|e| e.starts_with("release")).count(), 1);
    }

    #[test]
    fn test_file_change_stops_old_loop_before_starting_new() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        let a = lifecycle.set_file(Some(stl("a.stl"))).unwrap();
        let b = lifecycle.set_file(Some(stl("b.stl"))).unwrap();
        lifecycle.teardown();

        assert_ne!(a, b);
        let events = recorder.events();
        let stop_a = events.iter().position(|e| e == "stop_loop 1").unwrap();
        let start_b = events.iter().position(|e| e == "start 2").unwrap();
        assert!(stop_a < start_b);
        assert_eq!(recorder.max_running_loops.get(), 1);
        assert_eq!(recorder.running_loops.get(), 0);
    }

    #[test]
    fn test_clearing_file_tears_down() {
        let (mut lifecycle, _recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        lifecycle.set_file(Some(stl("a.stl")));
        assert_eq!(lifecycle.set_file(None), None);
        assert!(lifecycle.session().is_none());
    }

    #[test]
    fn test_unmount_tears_down_and_forgets_surface() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        lifecycle.set_file(Some(stl("a.stl")));
        lifecycle.unmount();

        assert!(lifecycle.session().is_none());
        assert!(lifecycle.surface().is_none());
        assert_eq!(recorder.running_loops.get(), 0);
    }

    #[test]
    fn test_late_completion_is_discarded() {
        let (mut lifecycle, _recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        let a = lifecycle.set_file(Some(stl("a.stl"))).unwrap();
        let b = lifecycle.set_file(Some(stl("b.stl"))).unwrap();

        // Bのデコードが先に完了し、Aのデコードが後から届く
        let delivered_b = lifecycle.deliver(b, |s| s.meshes.push("b".to_string()));
        let delivered_a = lifecycle.deliver(a, |s| s.meshes.push("a".to_string()));

        assert!(delivered_b.is_some());
        assert!(delivered_a.is_none());
        assert_eq!(lifecycle.session().unwrap().meshes, vec!["b".to_string()]);
    }

    #[test]
    fn test_completion_after_teardown_is_discarded() {
        let (mut lifecycle, _recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        let a = lifecycle.set_file(Some(stl("a.stl"))).unwrap();
        lifecycle.unmount();

        assert!(!lifecycle.is_current(a));
        assert!(lifecycle.deliver(a, |s| s.meshes.push("a".to_string())).is_none());
    }

    #[test]
    fn test_resize_forwards_and_ignores_zero() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        lifecycle.set_file(Some(stl("a.stl")));
        lifecycle.resize(SurfaceSize::new(0, 0));
        lifecycle.resize(SurfaceSize::new(800, 600));

        assert_eq!(lifecycle.surface(), Some(SurfaceSize::new(800, 600)));
        let resizes: Vec<_> = recorder
            .events()
            .into_iter()
            .filter(|e| e.starts_with("resize"))
            .collect();
        assert_eq!(resizes, vec!["resize 1 800x600".to_string()]);
    }

    #[test]
    fn test_backend_failure_leaves_no_session() {
        let recorder = Rc::new(Recorder::default());
        let backend = TestBackend {
            recorder: recorder.clone(),
            fail: true,
        };
        let mut lifecycle = LifecycleManager::new(backend);
        lifecycle.mount(SurfaceSize::new(640, 480));
        assert_eq!(lifecycle.set_file(Some(stl("a.stl"))), None);
        assert!(lifecycle.session().is_none());
    }

    #[test]
    fn test_drop_tears_down() {
        let (mut lifecycle, recorder) = manager();
        lifecycle.mount(SurfaceSize::new(640, 480));
        lifecycle.set_file(Some(stl("a.stl")));
        drop(lifecycle);
        assert_eq!(recorder.running_loops.get(), 0);
        assert!(recorder.events().contains(&"release 1".to_string()));
    }
}
