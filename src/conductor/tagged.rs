//! # Tagged conductor: one registry per tag.
//!
//! ## Architecture
//! ```text
//! Tagged<T>
//!   partitions: RwLock<HashMap<tag, Arc<Registry>>>     (shared by derived handles)
//!       ""      ─► Registry ─► [untagged listeners]
//!       "x"     ─► Registry ─► [x listeners]
//!       "y"     ─► Registry ─► [y listeners]
//!
//! with_tag("x").listen()   ─► partition "x" (created on first use) ─► listen
//! send(cmd, ["x"])         ─► existing partitions among ["x"]      ─► deliver
//! broadcast(cmd)           ─► every existing partition             ─► deliver
//! with_tags(["x", "y"])    ─► Simple fan-in fed by one relay per tag
//! ```
//!
//! ## Rules
//! - Partitions are created lazily by listening and never removed.
//! - Sending to a tag without a partition is a no-op, not an error.
//! - Partition lookups snapshot the table and release the lock before delivering.
//! - A partition created while a broadcast is in flight may miss that broadcast.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::Command;
use crate::config::DEFAULT_LISTENER_CAPACITY;
use crate::diagnostics::DeliveryLog;
use crate::lifecycle::{Context, Lifecycle};
use crate::policies::TaggedPolicy;
use crate::registry::{Listener, ListenerKey, Registry};
use crate::signals::{EventSource, spawn_bridge};

use super::Conductor;
use super::Simple;
use super::sealed::{Sealed, Variant};

/// Tag of the partition used by [`Tagged::listen`].
const UNTAGGED: &str = "";

type Partitions<T> = RwLock<HashMap<String, Arc<Registry<T>>>>;

/// Tag-partitioned command bus.
///
/// Cheap to clone; clones share partitions and lifecycle.
pub struct Tagged<T> {
    partitions: Arc<Partitions<T>>,
    lifecycle: Lifecycle,
    log: DeliveryLog,
    capacity: usize,
}

impl<T: Command> Tagged<T> {
    /// A tagged conductor with a background lifecycle and no delivery log.
    pub fn new() -> Self {
        Self::assemble(
            Lifecycle::background(),
            DeliveryLog::null(),
            DEFAULT_LISTENER_CAPACITY,
        )
    }

    /// A tagged conductor whose lifecycle is the one of `parent`.
    pub fn from_context(parent: &impl Context) -> Self {
        Self::new().with_lifecycle(parent.lifecycle().clone())
    }

    /// Wraps `simple`: its listeners become the untagged partition.
    ///
    /// Lifecycle and delivery log are inherited from `simple`.
    pub fn from_simple(simple: &Simple<T>) -> Self {
        let mut table = HashMap::new();
        table.insert(UNTAGGED.to_string(), Arc::clone(simple.registry()));
        Self {
            partitions: Arc::new(RwLock::new(table)),
            lifecycle: simple.lifecycle().clone(),
            log: simple.log().clone(),
            capacity: simple.registry().capacity(),
        }
    }

    pub(crate) fn assemble(lifecycle: Lifecycle, log: DeliveryLog, capacity: usize) -> Self {
        Self {
            partitions: Arc::new(RwLock::new(HashMap::new())),
            lifecycle,
            log,
            capacity: capacity.max(1),
        }
    }

    /// Rebinds this handle to `lifecycle`, keeping its partitions.
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Narrows this conductor to `tag` for listening and sending.
    ///
    /// Does not create the partition; the first `listen` on the scope does.
    pub fn with_tag(&self, tag: impl Into<String>) -> TagScope<T> {
        TagScope {
            tagged: self.clone(),
            tag: tag.into(),
        }
    }

    /// Registers a fresh listener on the untagged partition.
    pub fn listen(&self) -> Listener<T> {
        self.partition(UNTAGGED).listen()
    }

    /// Named listener on the untagged partition.
    pub fn listen_as(&self, name: impl Into<Cow<'static, str>>) -> Listener<T> {
        self.partition(UNTAGGED).listen_as(ListenerKey::named(name))
    }

    /// Tags that currently have a partition, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.partitions.read().keys().cloned().collect();
        tags.sort_unstable();
        tags
    }

    /// Delivers `cmd` to the partitions named in `tags` that exist.
    ///
    /// Each partition receives `cmd` once even if named twice.
    pub async fn send<S: AsRef<str>>(&self, cmd: T, tags: &[S]) {
        let targets = self.existing(tags);
        for registry in targets {
            registry.deliver(&cmd, &self.log).await;
        }
    }

    /// Delivers `cmd` to every existing partition.
    pub async fn broadcast(&self, cmd: T) {
        for (_, registry) in self.snapshot() {
            registry.deliver(&cmd, &self.log).await;
        }
    }

    /// Broadcasts `cmd` every time `source` fires, until the lifecycle ends.
    pub fn notify_all<S: EventSource>(&self, cmd: T, source: S) -> JoinHandle<()> {
        let me = self.clone();
        spawn_bridge(self.lifecycle.clone(), cmd, source, move |cmd| {
            let me = me.clone();
            async move { me.broadcast(cmd).await }
        })
    }

    /// Sends `cmd` to `tags` every time `source` fires, until the lifecycle ends.
    pub fn notify_tagged<S: EventSource>(
        &self,
        cmd: T,
        tags: Vec<String>,
        source: S,
    ) -> JoinHandle<()> {
        let me = self.clone();
        let tags: Arc<[String]> = tags.into();
        spawn_bridge(self.lifecycle.clone(), cmd, source, move |cmd| {
            let me = me.clone();
            let tags = Arc::clone(&tags);
            async move { me.send(cmd, &tags[..]).await }
        })
    }

    /// Attaches a per-partition shutdown policy, consulted once when the lifecycle ends.
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_lifecycle_policy<P: TaggedPolicy<T>>(self, policy: P) -> Self {
        let me = self.clone();
        tokio::spawn(async move {
            me.done().await;
            for (tag, registry) in me.snapshot() {
                match policy.decide(&tag) {
                    Some(cmd) => {
                        tracing::debug!(tag = %tag, ?cmd, "shutdown policy injects final command");
                        registry.deliver(&cmd, &me.log).await;
                    }
                    None => tracing::debug!(tag = %tag, "shutdown policy declined"),
                }
            }
        });
        self
    }

    /// Merges the partitions named in `tags` into one simple conductor.
    ///
    /// Missing partitions are created. One relay per tag forwards commands in
    /// the order that tag received them; there is no ordering across tags.
    /// Relays stop when the returned conductor's lifecycle (a child of this
    /// one's) ends, which also happens once the returned handle and all its
    /// clones are dropped.
    pub fn with_tags<I, S>(&self, tags: I) -> Simple<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (lifecycle, cancel) = Lifecycle::with_cancel(self);
        // Relays hold unguarded handles; only user handles keep the fan-in alive.
        let relay_target = Simple::assemble(lifecycle, self.log.clone(), self.capacity);

        let unique: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        for tag in unique {
            let upstream = self.partition(&tag).listen();
            let downstream = relay_target.clone();
            tokio::spawn(async move {
                tracing::debug!(tag = %tag, "fan-in relay started");
                loop {
                    tokio::select! {
                        biased;
                        _ = downstream.done() => break,
                        cmd = upstream.recv() => match cmd {
                            Some(cmd) => downstream.send(cmd).await,
                            None => break,
                        }
                    }
                }
                tracing::debug!(tag = %tag, "fan-in relay stopped");
            });
        }
        relay_target.guarded_by(cancel)
    }

    /// Returns the partition for `tag`, creating it on first use.
    pub(crate) fn partition(&self, tag: &str) -> Arc<Registry<T>> {
        if let Some(registry) = self.partitions.read().get(tag) {
            return Arc::clone(registry);
        }

        let mut table = self.partitions.write();
        let registry = table.entry(tag.to_string()).or_insert_with(|| {
            tracing::debug!(tag = %tag, "partition created");
            Arc::new(Registry::new(self.capacity))
        });
        Arc::clone(registry)
    }

    fn existing<S: AsRef<str>>(&self, tags: &[S]) -> Vec<Arc<Registry<T>>> {
        let unique: BTreeSet<&str> = tags.iter().map(AsRef::as_ref).collect();
        let table = self.partitions.read();
        unique
            .into_iter()
            .filter_map(|tag| table.get(tag).map(Arc::clone))
            .collect()
    }

    fn snapshot(&self) -> Vec<(String, Arc<Registry<T>>)> {
        self.partitions
            .read()
            .iter()
            .map(|(tag, registry)| (tag.clone(), Arc::clone(registry)))
            .collect()
    }
}

impl<T: Command> Default for Tagged<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Tagged<T> {
    fn clone(&self) -> Self {
        Self {
            partitions: Arc::clone(&self.partitions),
            lifecycle: self.lifecycle.clone(),
            log: self.log.clone(),
            capacity: self.capacity,
        }
    }
}

impl<T> fmt::Debug for Tagged<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tagged")
            .field("partitions", &self.partitions.read().len())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

impl<T> Context for Tagged<T> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl<T: Command> Conductor<T> for Tagged<T> {
    fn listen(&self) -> Listener<T> {
        Tagged::listen(self)
    }

    fn listen_as(&self, name: impl Into<Cow<'static, str>>) -> Listener<T> {
        Tagged::listen_as(self, name)
    }
}

impl<T: Command> Sealed<T> for Tagged<T> {
    fn variant(&self) -> Variant<'_, T> {
        Variant::Tagged(self)
    }

    fn rebind(&self, lifecycle: Lifecycle) -> Self {
        self.clone().with_lifecycle(lifecycle)
    }
}

/// A [`Tagged`] conductor narrowed to one tag.
///
/// Each call to [`Tagged::with_tag`] returns its own scope, so concurrent
/// callers never race over which tag they target.
pub struct TagScope<T> {
    tagged: Tagged<T>,
    tag: String,
}

impl<T: Command> TagScope<T> {
    /// The tag this scope targets.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Registers a fresh listener on this tag's partition.
    pub fn listen(&self) -> Listener<T> {
        self.tagged.partition(&self.tag).listen()
    }

    /// Named listener on this tag's partition.
    pub fn listen_as(&self, name: impl Into<Cow<'static, str>>) -> Listener<T> {
        self.tagged
            .partition(&self.tag)
            .listen_as(ListenerKey::named(name))
    }

    /// Delivers `cmd` to this tag's partition, if it exists.
    pub async fn send(&self, cmd: T) {
        self.tagged.send(cmd, &[self.tag.as_str()]).await;
    }

    /// The tagged conductor this scope was taken from.
    pub fn conductor(&self) -> &Tagged<T> {
        &self.tagged
    }
}

impl<T> Clone for TagScope<T> {
    fn clone(&self) -> Self {
        Self {
            tagged: self.tagged.clone(),
            tag: self.tag.clone(),
        }
    }
}

impl<T> fmt::Debug for TagScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagScope").field("tag", &self.tag).finish()
    }
}

impl<T> Context for TagScope<T> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.tagged.lifecycle
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::policies::{ConstantPolicy, SetPolicy};

    const WINDOW: Duration = Duration::from_millis(50);

    async fn next<T>(lis: &Listener<T>) -> Option<T> {
        tokio::time::timeout(WINDOW, lis.recv()).await.ok().flatten()
    }

    #[tokio::test]
    async fn send_reaches_named_tag_only() {
        let bus = Tagged::<&'static str>::new();
        let x = bus.with_tag("x").listen();
        let y = bus.with_tag("y").listen();

        let b = bus.clone();
        tokio::spawn(async move { b.send("go", &["x"]).await });

        assert_eq!(next(&x).await, Some("go"));
        assert_eq!(next(&y).await, None);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_partition() {
        let bus = Tagged::<&'static str>::new();
        let untagged = bus.listen();
        let a = bus.with_tag("a").listen();
        let b = bus.with_tag("b").listen();

        bus.broadcast("ciao").await;

        assert_eq!(untagged.try_recv(), Some("ciao"));
        assert_eq!(a.try_recv(), Some("ciao"));
        assert_eq!(b.try_recv(), Some("ciao"));
    }

    #[tokio::test]
    async fn unknown_tag_is_a_silent_no_op() {
        let bus = Tagged::<u8>::new();
        let a = bus.with_tag("a").listen();

        tokio::time::timeout(WINDOW, bus.send(1, &["ghost"]))
            .await
            .expect("no-op send must return");

        assert_eq!(a.try_recv(), None);
        assert_eq!(bus.tags(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_tags_deliver_once() {
        let bus = Tagged::<u8>::new();
        let a = bus.with_tag("a").listen();

        bus.send(1, &["a", "a"]).await;

        assert_eq!(a.try_recv(), Some(1));
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn with_tag_does_not_create_partition() {
        let bus = Tagged::<u8>::new();
        let scope = bus.with_tag("lazy");
        assert!(bus.tags().is_empty());

        let _lis = scope.listen();
        assert_eq!(bus.tags(), vec!["lazy".to_string()]);
        assert_eq!(scope.tag(), "lazy");
    }

    #[test]
    fn named_listeners_are_per_partition() {
        let bus = Tagged::<u8>::new();
        let a1 = bus.with_tag("a").listen_as("w");
        let a2 = bus.with_tag("a").listen_as("w");
        let b = bus.with_tag("b").listen_as("w");

        assert!(a1.same_channel(&a2));
        assert!(!a1.same_channel(&b));
    }

    #[tokio::test]
    async fn tag_scope_send_targets_its_tag() {
        let bus = Tagged::<u8>::new();
        let a = bus.with_tag("a").listen();
        let b = bus.with_tag("b").listen();

        bus.with_tag("a").send(4).await;

        assert_eq!(a.try_recv(), Some(4));
        assert_eq!(b.try_recv(), None);
    }

    #[tokio::test]
    async fn from_simple_exposes_simple_listeners_as_untagged() {
        let simple = Simple::<u8>::new();
        let old = simple.listen();
        let tagged = Tagged::from_simple(&simple);
        let fresh = tagged.with_tag("t").listen();

        tagged.broadcast(2).await;

        assert_eq!(old.try_recv(), Some(2));
        assert_eq!(fresh.try_recv(), Some(2));
        assert_eq!(tagged.tags(), vec![String::new(), "t".to_string()]);
    }

    #[tokio::test]
    async fn set_policy_targets_listed_tags() {
        let (scope, cancel) = Lifecycle::with_cancel(&Lifecycle::background());
        let bus = Tagged::<&'static str>::from_context(&scope)
            .with_lifecycle_policy(SetPolicy::from_iter([("zeroth", "ciao"), ("first", "ciao")]));

        let zeroth = bus.with_tag("zeroth").listen();
        let first = bus.with_tag("first").listen();
        let second = bus.with_tag("second").listen();
        cancel.cancel();

        assert_eq!(next(&zeroth).await, Some("ciao"));
        assert_eq!(next(&first).await, Some("ciao"));
        assert_eq!(next(&second).await, None);
    }

    #[tokio::test]
    async fn constant_policy_reaches_each_partition_once() {
        let (bus, cancel) = crate::with_cancel(&Tagged::<u8>::new());
        let bus = bus.with_lifecycle_policy(ConstantPolicy::new(9));
        let untagged = bus.listen();
        let t = bus.with_tag("t").listen();

        cancel.cancel();

        assert_eq!(next(&untagged).await, Some(9));
        assert_eq!(next(&t).await, Some(9));
        assert_eq!(next(&untagged).await, None);
        assert_eq!(next(&t).await, None);
    }

    #[tokio::test]
    async fn notify_all_broadcasts_each_event() {
        let bus = Tagged::<&'static str>::new();
        let untagged = bus.listen();
        let first = bus.with_tag("first").listen();
        let (trigger, source) = mpsc::channel::<()>(1);
        let _bridge = bus.notify_all("ciao", source);

        trigger.send(()).await.expect("bridge alive");

        assert_eq!(next(&untagged).await, Some("ciao"));
        assert_eq!(next(&first).await, Some("ciao"));
    }

    #[tokio::test]
    async fn notify_all_stops_when_lifecycle_ends() {
        let (bus, cancel) = crate::with_cancel(&Tagged::<&'static str>::new());
        let first = bus.with_tag("first").listen();
        let (trigger, source) = mpsc::channel::<()>(4);
        let bridge = bus.notify_all("ciao", source);

        trigger.send(()).await.expect("bridge alive");
        assert_eq!(next(&first).await, Some("ciao"));

        cancel.cancel();
        tokio::time::timeout(WINDOW, bridge)
            .await
            .expect("bridge should exit")
            .expect("bridge task ok");

        let _ = trigger.send(()).await;
        assert_eq!(next(&first).await, None);
    }

    #[tokio::test]
    async fn notify_tagged_stops_when_lifecycle_ends() {
        let (bus, cancel) = crate::with_cancel(&Tagged::<u8>::new());
        let (_trigger, source) = mpsc::channel::<()>(1);
        let bridge = bus.notify_tagged(1, vec!["first".to_string()], source);

        cancel.cancel();

        tokio::time::timeout(WINDOW, bridge)
            .await
            .expect("bridge should exit")
            .expect("bridge task ok");
    }

    #[tokio::test]
    async fn notify_tagged_skips_other_tags() {
        let bus = Tagged::<&'static str>::new();
        let first = bus.with_tag("first").listen();
        let second = bus.with_tag("second").listen();
        let (trigger, source) = mpsc::channel::<()>(1);
        let _bridge = bus.notify_tagged("ciao", vec!["first".to_string()], source);

        trigger.send(()).await.expect("bridge alive");

        assert_eq!(next(&first).await, Some("ciao"));
        assert_eq!(next(&second).await, None);
    }

    #[tokio::test]
    async fn with_tags_merges_named_partitions() {
        let bus = Tagged::<&'static str>::new();
        let merged = bus.with_tags(["x", "y"]);
        let out = merged.listen();
        let z = bus.with_tag("z").listen();

        bus.send("from-x", &["x"]).await;
        assert_eq!(next(&out).await, Some("from-x"));
        bus.send("from-y", &["y"]).await;
        assert_eq!(next(&out).await, Some("from-y"));
        bus.send("from-z", &["z"]).await;
        assert_eq!(next(&out).await, None);
        assert_eq!(z.try_recv(), Some("from-z"));
    }

    #[tokio::test]
    async fn with_tags_preserves_per_tag_order() {
        let bus = Tagged::<u32>::new();
        let merged = bus.with_tags(["x"]);
        let out = merged.listen();

        let b = bus.clone();
        tokio::spawn(async move {
            for i in 0..4 {
                b.send(i, &["x"]).await;
            }
        });

        for i in 0..4 {
            assert_eq!(next(&out).await, Some(i));
        }
    }

    #[tokio::test]
    async fn dropping_fan_in_releases_relays() {
        let bus = Tagged::<u8>::new();
        let merged = bus.with_tags(["x"]);
        let lifecycle = merged.lifecycle().clone();
        assert_eq!(bus.partition("x").len(), 1);

        drop(merged);
        tokio::time::timeout(WINDOW, lifecycle.done())
            .await
            .expect("fan-in lifecycle should end");
        tokio::time::sleep(Duration::from_millis(10)).await;

        bus.send(1, &["x"]).await;
        assert_eq!(bus.partition("x").len(), 0);
    }

    #[tokio::test]
    async fn fan_in_clone_keeps_relays_running() {
        let bus = Tagged::<u8>::new();
        let merged = bus.with_tags(["x"]);
        let kept = merged.clone();
        let out = kept.listen();

        drop(merged);
        bus.send(6, &["x"]).await;

        assert_eq!(next(&out).await, Some(6));
        assert!(!kept.is_done());
    }

    #[tokio::test]
    async fn fan_in_ends_with_parent() {
        let (bus, cancel) = crate::with_cancel(&Tagged::<u8>::new());
        let merged = bus.with_tags(["x"]);

        cancel.cancel();

        tokio::time::timeout(WINDOW, merged.done())
            .await
            .expect("fan-in lifecycle is a child");
    }
}
