// Test-only harness for end-to-end navigation scenarios.
//
// Wires the real engine pieces together the way a bot client would:
// `MinecraftGraph` expansion behind a reference best-first searcher, a
// `PathController` running that searcher on the rayon pool, and a
// `RecordingBot` driven tick by tick. The only test-specific code is:
//
// - `TestWorld`, a builder for small block grids;
// - `Kinematics`, a crude stand-in for client physics (walk along the yaw,
//   jump, gravity, land on block tops, step up slabs);
// - `find_route`, a plain A* over graph edges that tracks the usable block
//   count along each path so bridges never go negative;
// - `Scenario`, which owns the bot and loops controller tick, physics step
//   and world snapshot until the route finishes.
//
// See also: `tests/graph_properties.rs` for property tests of the graph
// alone, `tests/route_execution.rs` for full scenarios.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use blocknav_engine::action::ActionRegistry;
use blocknav_engine::block::{BlockRegistry, BlockStateId};
use blocknav_engine::bot::BotConnection;
use blocknav_engine::config::NavConfig;
use blocknav_engine::constraint::DefaultPathConstraint;
use blocknav_engine::controller::{ControllerStatus, PathController, PathSearcher, RoutePlan};
use blocknav_engine::error::{GraphError, SearchError};
use blocknav_engine::graph::{GraphInstruction, MinecraftGraph, PlannedAction};
use blocknav_engine::inventory::{ItemStack, PlayerInventory, ProjectedInventory};
use blocknav_engine::testing::RecordingBot;
use blocknav_engine::types::{Vec3d, Vec3i};
use blocknav_engine::world::{BlockAccessor, BlockGrid, BuildHeight};
use rustc_hash::FxHashMap;

/// Half the horizontal extent of a `TestWorld`.
pub const WORLD_RADIUS: i32 = 12;
/// Lowest y of a `TestWorld`.
pub const WORLD_BOTTOM: i32 = -8;
pub const WORLD_HEIGHT: u32 = 24;

/// How long a scenario waits for a single route search.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Worlds
// ---------------------------------------------------------------------------

/// A small block grid centred on the origin, plus the registry it uses.
#[derive(Clone)]
pub struct TestWorld {
    pub registry: Arc<BlockRegistry>,
    pub grid: BlockGrid,
}

impl TestWorld {
    /// All air.
    pub fn empty() -> Self {
        let side = (WORLD_RADIUS * 2 + 1) as u32;
        Self {
            registry: Arc::new(BlockRegistry::standard()),
            grid: BlockGrid::new(
                Vec3i::new(-WORLD_RADIUS, WORLD_BOTTOM, -WORLD_RADIUS),
                side,
                WORLD_HEIGHT,
                side,
            ),
        }
    }

    /// Stone from the bottom of the world up to y = -1, so the bot stands
    /// at y = 0.
    pub fn flat() -> Self {
        Self::empty().fill(
            Vec3i::new(-WORLD_RADIUS, WORLD_BOTTOM, -WORLD_RADIUS),
            Vec3i::new(WORLD_RADIUS, -1, WORLD_RADIUS),
            "stone",
        )
    }

    pub fn state(&self, name: &str) -> BlockStateId {
        self.registry
            .state_by_name(name)
            .unwrap_or_else(|| panic!("unknown block {name}"))
    }

    pub fn set(mut self, pos: Vec3i, name: &str) -> Self {
        let state = self.state(name);
        self.grid.set(pos, state);
        self
    }

    /// Fill the inclusive box `min..=max`.
    pub fn fill(mut self, min: Vec3i, max: Vec3i, name: &str) -> Self {
        let state = self.state(name);
        self.grid.fill(min, max, state);
        self
    }

    pub fn clear(self, min: Vec3i, max: Vec3i) -> Self {
        self.fill(min, max, "air")
    }

    pub fn name_at(&self, pos: Vec3i) -> &str {
        &self.registry.block_type_of(self.grid.get(pos)).name
    }
}

/// Wraps a grid and counts reads per position.
pub struct CountingAccessor<'a> {
    pub grid: &'a BlockGrid,
    reads: Mutex<FxHashMap<Vec3i, u32>>,
}

impl<'a> CountingAccessor<'a> {
    pub fn new(grid: &'a BlockGrid) -> Self {
        Self {
            grid,
            reads: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn reads(&self) -> FxHashMap<Vec3i, u32> {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        self.reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl BlockAccessor for CountingAccessor<'_> {
    fn block_state(&self, pos: Vec3i) -> BlockStateId {
        *self
            .reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(pos)
            .or_insert(0) += 1;
        self.grid.get(pos)
    }
}

// ---------------------------------------------------------------------------
// Engine wiring
// ---------------------------------------------------------------------------

/// The frozen tables and policy shared by every query of a scenario.
pub struct Navigator {
    pub registry: Arc<BlockRegistry>,
    pub actions: ActionRegistry,
    pub constraint: DefaultPathConstraint,
}

impl Navigator {
    pub fn new(registry: Arc<BlockRegistry>, config: &NavConfig) -> Self {
        let constraint =
            DefaultPathConstraint::new(registry.clone(), config, BuildHeight::OVERWORLD);
        Self {
            registry,
            actions: ActionRegistry::build(),
            constraint,
        }
    }

    pub fn items(&self, items: &[(&str, u32)]) -> Vec<ItemStack> {
        items
            .iter()
            .map(|&(name, count)| {
                let item = self
                    .registry
                    .item_by_name(name)
                    .unwrap_or_else(|| panic!("unknown item {name}"));
                ItemStack::new(item, count)
            })
            .collect()
    }

    pub fn projected(&self, items: &[(&str, u32)]) -> ProjectedInventory {
        ProjectedInventory::from_items(&self.items(items), self.registry.clone(), &self.constraint)
    }

    pub fn graph<'a>(
        &'a self,
        level: &'a (dyn BlockAccessor + Sync),
        inventory: &'a ProjectedInventory,
    ) -> MinecraftGraph<'a> {
        MinecraftGraph::new(
            &self.actions,
            self.constraint.tables(),
            level,
            inventory,
            &self.constraint,
        )
    }
}

// ---------------------------------------------------------------------------
// Reference searcher
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Route {
    pub actions: Vec<PlannedAction>,
    pub edges: Vec<GraphInstruction>,
    pub cost: f64,
    pub reached_goal: bool,
    pub expansions: usize,
}

struct Frontier {
    priority: f64,
    node: Vec3i,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    /// Reversed, so `BinaryHeap` pops the lowest priority first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.node.packed().cmp(&self.node.packed()))
    }
}

struct Visit {
    cost: f64,
    blocks: i64,
    parent: Option<(Vec3i, GraphInstruction)>,
    closed: bool,
}

/// A* from `start` to `goal` over graph edges, expanding at most `budget`
/// nodes. On budget exhaustion, or when the only way on leads into
/// unloaded terrain, the route to the node nearest the goal is returned
/// with `reached_goal == false`.
pub fn find_route(
    graph: &MinecraftGraph<'_>,
    start: Vec3i,
    goal: Vec3i,
    budget: usize,
) -> Result<Route, SearchError> {
    let heuristic = |node: Vec3i| node.distance(goal);
    let mut visits: FxHashMap<Vec3i, Visit> = FxHashMap::default();
    let mut open = BinaryHeap::new();
    visits.insert(
        start,
        Visit {
            cost: 0.0,
            blocks: i64::from(graph.inventory().usable_block_item_count()),
            parent: None,
            closed: false,
        },
    );
    open.push(Frontier {
        priority: heuristic(start),
        node: start,
    });
    let mut nearest = (heuristic(start), start);
    let mut expansions = 0;
    let mut hit_unloaded = false;

    while let Some(Frontier { node, .. }) = open.pop() {
        let Some(visit) = visits.get_mut(&node) else {
            continue;
        };
        if visit.closed {
            continue;
        }
        visit.closed = true;
        if node == goal {
            return Ok(rebuild(&visits, node, true, expansions));
        }
        if expansions >= budget {
            log::debug!("search budget of {budget} expansions used up");
            if nearest.1 == start {
                return Err(SearchError::Expired);
            }
            return Ok(rebuild(&visits, nearest.1, false, expansions));
        }
        expansions += 1;

        let (cost, blocks) = (visit.cost, visit.blocks);
        let incoming = visit.parent.as_ref().map(|(_, edge)| edge.direction);
        let edges = match graph.expand(node, incoming) {
            Ok(edges) => edges,
            Err(e) if node == start => return Err(e.into()),
            Err(GraphError::OutOfLevel { pos }) => {
                log::debug!("skipping {node}: {pos} is not loaded");
                hit_unloaded = true;
                continue;
            }
        };
        for edge in edges {
            let blocks_after = blocks + i64::from(edge.block_item_delta);
            if blocks_after < 0 {
                continue;
            }
            let cost_after = cost + edge.cost;
            let improves = visits
                .get(&edge.target)
                .is_none_or(|v| !v.closed && cost_after < v.cost);
            if !improves {
                continue;
            }
            let remaining = heuristic(edge.target);
            if remaining < nearest.0 {
                nearest = (remaining, edge.target);
            }
            open.push(Frontier {
                priority: cost_after + remaining,
                node: edge.target,
            });
            visits.insert(
                edge.target,
                Visit {
                    cost: cost_after,
                    blocks: blocks_after,
                    parent: Some((node, edge)),
                    closed: false,
                },
            );
        }
    }
    if hit_unloaded && nearest.1 != start {
        log::debug!("unloaded terrain ends the search at {}", nearest.1);
        return Ok(rebuild(&visits, nearest.1, false, expansions));
    }
    Err(SearchError::NoRoute)
}

fn rebuild(
    visits: &FxHashMap<Vec3i, Visit>,
    end: Vec3i,
    reached_goal: bool,
    expansions: usize,
) -> Route {
    let mut edges = Vec::new();
    let mut node = end;
    while let Some((parent, edge)) = visits.get(&node).and_then(|v| v.parent.as_ref()) {
        edges.push(edge.clone());
        node = *parent;
    }
    edges.reverse();
    Route {
        actions: edges.iter().flat_map(|e| e.actions.iter().copied()).collect(),
        cost: edges.iter().map(|e| e.cost).sum(),
        edges,
        reached_goal,
        expansions,
    }
}

/// What the searcher sees of the bot: the level, its feet block and its
/// inventory, as of the last published tick.
#[derive(Clone)]
pub struct WorldSnapshot {
    pub grid: BlockGrid,
    pub feet: Vec3i,
    pub inventory: PlayerInventory,
}

pub struct ReferenceSearcher {
    navigator: Arc<Navigator>,
    snapshot: Arc<Mutex<WorldSnapshot>>,
    goal: Vec3i,
    budget: usize,
    searches: Arc<AtomicUsize>,
}

impl PathSearcher for ReferenceSearcher {
    fn find_path(&self, is_initial: bool) -> Result<RoutePlan, SearchError> {
        self.searches.fetch_add(1, AtomicOrdering::Relaxed);
        let snapshot = self
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let inventory = ProjectedInventory::from_player(
            &snapshot.inventory,
            self.navigator.registry.clone(),
            &self.navigator.constraint,
        );
        let graph = self.navigator.graph(&snapshot.grid, &inventory);
        let route = find_route(&graph, snapshot.feet, self.goal, self.budget)?;
        log::info!(
            "{} search from {} found {} steps (cost {:.2}, {} expansions, goal reached: {})",
            if is_initial { "initial" } else { "follow-up" },
            snapshot.feet,
            route.actions.len(),
            route.cost,
            route.expansions,
            route.reached_goal
        );
        Ok(RoutePlan {
            start: snapshot.feet,
            actions: route.actions,
            partial: !route.reached_goal,
        })
    }
}

// ---------------------------------------------------------------------------
// Physics stand-in
// ---------------------------------------------------------------------------

/// Blocks per tick while walking.
pub const WALK_SPEED: f64 = 0.15;
pub const JUMP_VELOCITY: f64 = 0.42;
const GRAVITY: f64 = 0.08;
const DRAG: f64 = 0.98;
const STEP_HEIGHT: f64 = 0.6;
const BOT_HEIGHT: f64 = 1.8;

/// Point-mass movement: enough physics for routes to be walkable, nothing
/// more. Horizontal collision only checks the column under the centre.
#[derive(Debug, Default)]
pub struct Kinematics {
    vertical_velocity: f64,
}

impl Kinematics {
    pub fn step(&mut self, bot: &mut RecordingBot) {
        let mut position = bot.pose.position;
        if bot.controls.forward {
            let yaw = f64::from(bot.pose.yaw).to_radians();
            let next = position.offset(-yaw.sin() * WALK_SPEED, 0.0, yaw.cos() * WALK_SPEED);
            if !blocked(bot, next) {
                position = next;
            }
        }

        let ground = ground_height(bot, position);
        if bot.pose.on_ground {
            if bot.controls.jumping {
                self.vertical_velocity = JUMP_VELOCITY;
            } else if let Some(top) = ground
                && top > position.y
                && top - position.y <= STEP_HEIGHT
            {
                position.y = top;
            }
        }

        let velocity = self.vertical_velocity;
        let next_y = position.y + velocity;
        self.vertical_velocity = (velocity - GRAVITY) * DRAG;
        match ground {
            Some(top) if velocity <= 0.0 && next_y <= top => {
                position.y = top;
                self.vertical_velocity = 0.0;
                bot.pose.on_ground = true;
            }
            _ => {
                position.y = next_y;
                bot.pose.on_ground = false;
            }
        }
        bot.pose.position = position;
    }
}

fn shape_top(bot: &RecordingBot, pos: Vec3i) -> Option<f64> {
    let state = bot.level.get(pos);
    let shape = bot.registry.shape(state);
    (!shape.is_empty()).then(|| f64::from(pos.y) + shape.max_y())
}

/// Top of whatever the feet would rest on: the block the feet are in, or
/// the one below.
fn ground_height(bot: &RecordingBot, position: Vec3d) -> Option<f64> {
    let feet = Vec3i::from_position(position);
    shape_top(bot, feet).or_else(|| shape_top(bot, feet.sub(0, 1, 0)))
}

fn blocked(bot: &RecordingBot, next: Vec3d) -> bool {
    let bottom = next.y.floor() as i32;
    let top = (next.y + BOT_HEIGHT - 0.01).floor() as i32;
    (bottom..=top).any(|y| {
        let cell = Vec3i::new(next.x.floor() as i32, y, next.z.floor() as i32);
        shape_top(bot, cell).is_some_and(|t| t > next.y + STEP_HEIGHT)
    })
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

pub struct ScenarioBuilder {
    world: TestWorld,
    start: Vec3i,
    goal: Vec3i,
    config: NavConfig,
    items: Vec<(String, u32)>,
    budget: usize,
}

impl ScenarioBuilder {
    pub fn config(mut self, config: NavConfig) -> Self {
        self.config = config;
        self
    }

    pub fn give(mut self, name: &str, count: u32) -> Self {
        self.items.push((name.to_string(), count));
        self
    }

    /// Node expansions per search before a partial route is returned.
    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn build(self) -> Scenario {
        let navigator = Arc::new(Navigator::new(self.world.registry.clone(), &self.config));
        let mut bot = RecordingBot::new(self.world.registry.clone(), self.world.grid, self.start);
        for (name, count) in &self.items {
            bot.give(name, *count);
        }
        let snapshot = Arc::new(Mutex::new(WorldSnapshot {
            grid: bot.level.clone(),
            feet: self.start,
            inventory: bot.inventory.clone(),
        }));
        let searches = Arc::new(AtomicUsize::new(0));
        let searcher = ReferenceSearcher {
            navigator,
            snapshot: snapshot.clone(),
            goal: self.goal,
            budget: self.budget,
            searches: searches.clone(),
        };
        Scenario {
            bot,
            kinematics: Kinematics::default(),
            controller: PathController::new(Arc::new(searcher), self.config),
            snapshot,
            searches,
            goal: self.goal,
            ticks: 0,
            errors: Vec::new(),
        }
    }
}

pub struct Scenario {
    pub bot: RecordingBot,
    pub kinematics: Kinematics,
    pub controller: PathController,
    snapshot: Arc<Mutex<WorldSnapshot>>,
    searches: Arc<AtomicUsize>,
    pub goal: Vec3i,
    /// Game ticks run so far.
    pub ticks: u32,
    /// Execution errors the controller reported, in order.
    pub errors: Vec<String>,
}

impl Scenario {
    /// A scenario with the default config minus the recalculation pause.
    pub fn builder(world: TestWorld, start: Vec3i, goal: Vec3i) -> ScenarioBuilder {
        ScenarioBuilder {
            world,
            start,
            goal,
            config: NavConfig {
                recalculate_settle_ms: 0,
                ..NavConfig::default()
            },
            items: Vec::new(),
            budget: 5_000,
        }
    }

    /// Register the controller (once) and tick until the route is done or
    /// `max_ticks` have run. Returns the final status.
    pub fn run(&mut self, max_ticks: u32) -> ControllerStatus {
        if self.controller.status() == ControllerStatus::Idle {
            self.controller.register();
        }
        for _ in 0..max_ticks {
            let status = self.controller.wait_while_calculating(SEARCH_TIMEOUT);
            if status.is_done() {
                return status;
            }
            if let Err(e) = self.controller.tick(&mut self.bot) {
                self.errors.push(e.to_string());
            }
            self.kinematics.step(&mut self.bot);
            self.publish();
            self.ticks += 1;
        }
        self.controller.status()
    }

    /// Run physics only, e.g. to let the bot land after the route ends.
    pub fn settle(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.kinematics.step(&mut self.bot);
        }
        self.publish();
    }

    pub fn name_at(&self, pos: Vec3i) -> &str {
        &self.bot.registry.block_type_of(self.bot.level.get(pos)).name
    }

    /// Route searches started so far.
    pub fn searches(&self) -> usize {
        self.searches.load(AtomicOrdering::Relaxed)
    }

    /// Feet block of the bot right now.
    pub fn feet(&self) -> Vec3i {
        self.bot.pose().block_position()
    }

    pub fn count_of(&self, item: &str) -> u32 {
        let Some(id) = self.bot.registry.item_by_name(item) else {
            return 0;
        };
        self.bot
            .inventory
            .items()
            .filter(|s| s.item == id)
            .map(|s| s.count)
            .sum()
    }

    fn publish(&self) {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        snapshot.grid = self.bot.level.clone();
        snapshot.feet = self.feet();
        snapshot.inventory = self.bot.inventory.clone();
    }
}
