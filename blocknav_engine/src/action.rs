// Movement templates and the frozen subscription tables.
//
// Every movement the bot can make from a node is one `ActionTemplate`:
// straight and diagonal walks under each height modifier, gap jumps, the
// dig-down and the tower-up. A template never reads the world itself. At
// build time it declares, through `TemplateBuilder`, the relative offsets
// it cares about and what each one means for it (`Subscription`). The
// registry folds all declarations into one table keyed by offset:
//
//   keys[i]         relative block offset
//   subscribers[i]  (template index, meaning) pairs interested in it
//
// Keys are sorted by descending fan-out after registration, so the offsets
// that decide the most templates are fetched first and impossible
// templates drop out early. The sort is stable: equal fan-out keeps
// first-registration order.
//
// Registration order (66 templates):
//   for each MovementDirection, for each MovementModifier:
//     straight: one simple walk; diagonal: one per MovementSide
//   then 4 parkour jumps, then down, then up.
//
// See also: `graph.rs` for the per-query evaluation of these tables,
// `types.rs` for the direction vocabulary, `costs.rs` for base costs.
//
// **Critical constraint: frozen after build.** `ActionRegistry` is
// immutable once `build()` returns and is shared read-only across
// concurrent graph queries. All per-query state lives in `graph.rs`.

use crate::block::{BlockRegistry, BlockStateId};
use crate::costs::{DIAGONAL, FALL_1, FALL_2, FALL_3, JUMP_UP_BLOCK, ONE_GAP_JUMP, STRAIGHT};
use crate::types::{
    ActionDirection, BlockFace, BodyPart, MovementDirection, MovementModifier, MovementSide,
    ParkourDirection, SkyDirection, Vec3i,
};
use rustc_hash::FxHashMap;
use std::cmp::Reverse;

/// Free-space slots a template can mark for breaking. Straight jump-ups
/// use the most: two head-room blocks plus the two target-edge blocks.
pub const MAX_BREAK_SLOTS: usize = 4;

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

/// What makes breaking a block unsafe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SafetyKind {
    /// A fluid would flow into the hole.
    Fluids,
    /// Sits above the broken block: a falling block would drop into the
    /// hole, or a fluid would flow in.
    FallingAndFluids,
}

impl SafetyKind {
    pub fn is_unsafe(self, registry: &BlockRegistry, state: BlockStateId) -> bool {
        match self {
            SafetyKind::Fluids => registry.is_fluid(state),
            SafetyKind::FallingAndFluids => {
                registry.is_fluid(state) || registry.is_falling(state)
            }
        }
    }
}

/// The meaning one offset has for one template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subscription {
    /// Must be passable, or broken. `slot` numbers the block within the
    /// template's break order. `edge` is set for target-edge blocks, whose
    /// partial shapes are refined through the simple collision table.
    Free {
        slot: u8,
        face: BlockFace,
        edge: Option<(MovementDirection, BodyPart)>,
    },
    /// Neighbor of the free block in `slot`; breaking that block is unsafe
    /// when this one matches `kind`.
    BreakSafety { slot: u8, kind: SafetyKind },
    /// The block the bot lands on.
    Solid,
    /// Candidate to place the floor block against, clicking `face`.
    AgainstPlace { face: BlockFace },
    /// The corner opposite the squeeze side of a diagonal move.
    CornerCost,
    /// The corner a diagonal move squeezes past.
    DiagonalSqueeze {
        direction: MovementDirection,
        part: BodyPart,
        side: MovementSide,
    },
    /// The gap of a parkour jump; must not be walkable.
    ParkourGap,
    /// Possible landing of a dig-down.
    DownLanding,
    /// Block a dig-down falls through on its way to the landing.
    DownObstruct,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscriber {
    /// Index into `ActionRegistry::templates()`.
    pub action: u16,
    pub subscription: Subscription,
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// The closed set of movement families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementKind {
    Simple {
        direction: MovementDirection,
        /// Squeeze side, diagonals only.
        side: Option<MovementSide>,
        modifier: MovementModifier,
        /// Breaking and bridging are only attempted on straight moves that
        /// end at most one block lower.
        allow_block_actions: bool,
    },
    Parkour { direction: ParkourDirection },
    Down,
    Up,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActionTemplate {
    pub kind: MovementKind,
    pub direction: ActionDirection,
    /// Relative position the bot ends up at.
    pub target: Vec3i,
    /// Cost before mining, placing and corner extras. Zero for `Up` and
    /// `Down`, whose costs depend on the constraint and the landing.
    pub base_cost: f64,
    /// Number of subscriptions that must resolve before emitting.
    pub subscription_count: u16,
}

impl ActionTemplate {
    pub fn is_diagonal(&self) -> bool {
        matches!(self.kind, MovementKind::Simple { direction, .. } if direction.is_diagonal())
    }
}

fn modifier_cost(modifier: MovementModifier) -> f64 {
    match modifier {
        MovementModifier::Normal => 0.0,
        MovementModifier::Fall1 => FALL_1,
        MovementModifier::Fall2 => FALL_2,
        MovementModifier::Fall3 => FALL_3,
        MovementModifier::JumpUpBlock => JUMP_UP_BLOCK,
    }
}

fn opposite_face(dir: SkyDirection) -> BlockFace {
    dir.opposite().to_block_face()
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Collects subscriptions while templates register.
struct TemplateBuilder {
    templates: Vec<ActionTemplate>,
    index: FxHashMap<Vec3i, usize>,
    keys: Vec<Vec3i>,
    subscribers: Vec<Vec<Subscriber>>,
}

impl TemplateBuilder {
    fn new() -> Self {
        Self {
            templates: Vec::new(),
            index: FxHashMap::default(),
            keys: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    fn begin(&mut self, kind: MovementKind, direction: ActionDirection, target: Vec3i, base_cost: f64) {
        self.templates.push(ActionTemplate {
            kind,
            direction,
            target,
            base_cost,
            subscription_count: 0,
        });
    }

    /// Subscribe the template being registered to `offset`.
    fn subscribe(&mut self, offset: Vec3i, subscription: Subscription) {
        let action = (self.templates.len() - 1) as u16;
        let key = *self.index.entry(offset).or_insert_with(|| {
            self.keys.push(offset);
            self.subscribers.push(Vec::new());
            self.keys.len() - 1
        });
        self.subscribers[key].push(Subscriber {
            action,
            subscription,
        });
        if let Some(template) = self.templates.last_mut() {
            template.subscription_count += 1;
        }
    }

    fn finish(self) -> ActionRegistry {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by_key(|&i| Reverse(self.subscribers[i].len()));
        let keys: Vec<Vec3i> = order.iter().map(|&i| self.keys[i]).collect();
        let mut subscribers = self.subscribers;
        let subscribers: Vec<Box<[Subscriber]>> = order
            .iter()
            .map(|&i| std::mem::take(&mut subscribers[i]).into_boxed_slice())
            .collect();
        log::debug!(
            "Registered {} movement templates over {} offsets",
            self.templates.len(),
            keys.len()
        );
        ActionRegistry {
            templates: self.templates.into_boxed_slice(),
            keys: keys.into_boxed_slice(),
            subscribers: subscribers.into_boxed_slice(),
        }
    }
}

/// Free-slot bookkeeping for one template; the break order is the order
/// `next` is called.
struct Slots(u8);

impl Slots {
    fn next(&mut self) -> u8 {
        let slot = self.0;
        self.0 += 1;
        slot
    }
}

fn register_simple(
    b: &mut TemplateBuilder,
    direction: MovementDirection,
    side: Option<MovementSide>,
    modifier: MovementModifier,
) {
    let diagonal = direction.is_diagonal();
    let allow_block_actions = !diagonal
        && matches!(
            modifier,
            MovementModifier::Normal | MovementModifier::Fall1 | MovementModifier::JumpUpBlock
        );
    let edge = direction.offset(Vec3i::ZERO);
    let target = modifier.offset(edge);
    let base = if diagonal { DIAGONAL } else { STRAIGHT };
    b.begin(
        MovementKind::Simple {
            direction,
            side,
            modifier,
            allow_block_actions,
        },
        ActionDirection::Horizontal(direction),
        target,
        base + modifier_cost(modifier),
    );

    let sky = direction.to_sky();
    // Neighbours that make breaking the block at `pos` unsafe: what sits on
    // top of it (when `above`), then fluids on three sides.
    let safety = |b: &mut TemplateBuilder, slot: u8, pos: Vec3i, above: bool, sides: [SkyDirection; 3]| {
        if !allow_block_actions {
            return;
        }
        if above {
            b.subscribe(
                pos.add(0, 1, 0),
                Subscription::BreakSafety {
                    slot,
                    kind: SafetyKind::FallingAndFluids,
                },
            );
        }
        for dir in sides {
            b.subscribe(
                dir.offset(pos),
                Subscription::BreakSafety {
                    slot,
                    kind: SafetyKind::Fluids,
                },
            );
        }
    };
    let mut slots = Slots(0);

    // Head room for the jump.
    if modifier == MovementModifier::JumpUpBlock {
        for pos in [Vec3i::new(0, 1, 0), Vec3i::new(0, 2, 0)] {
            let slot = slots.next();
            b.subscribe(
                pos,
                Subscription::Free {
                    slot,
                    face: BlockFace::Bottom,
                    edge: None,
                },
            );
            if pos.y == 2
                && let Some(sky) = sky
            {
                safety(
                    b,
                    slot,
                    pos,
                    true,
                    [sky.opposite(), sky.left_side(), sky.right_side()],
                );
            }
        }
    }

    // Squeeze corner on `side`, cost corner on the other.
    if let Some(side) = side {
        for part in BodyPart::STANDING_TOP_DOWN {
            if let Some(corner) = direction.corner(side) {
                let pos = part.offset(modifier.offset_if_jump(corner.offset(Vec3i::ZERO)));
                b.subscribe(
                    pos,
                    Subscription::DiagonalSqueeze {
                        direction,
                        part,
                        side,
                    },
                );
            }
        }
        for part in BodyPart::STANDING_TOP_DOWN {
            if let Some(corner) = direction.corner(side.opposite()) {
                let pos = part.offset(modifier.offset_if_jump(corner.offset(Vec3i::ZERO)));
                b.subscribe(pos, Subscription::CornerCost);
            }
        }
    }

    // The target column, top block first.
    let face = sky.map_or(BlockFace::Top, opposite_face);
    for part in BodyPart::STANDING_TOP_DOWN {
        let pos = part.offset(modifier.offset_if_jump(edge));
        let slot = slots.next();
        b.subscribe(
            pos,
            Subscription::Free {
                slot,
                face,
                edge: Some((direction, part)),
            },
        );
        if let Some(sky) = sky {
            safety(
                b,
                slot,
                pos,
                part == BodyPart::Body,
                [sky, sky.left_side(), sky.right_side()],
            );
        }
    }

    // The drop below the edge.
    let fall_depth = match modifier {
        MovementModifier::Fall1 => 1,
        MovementModifier::Fall2 => 2,
        MovementModifier::Fall3 => 3,
        _ => 0,
    };
    for depth in 1..=fall_depth {
        let pos = edge.sub(0, depth, 0);
        let slot = slots.next();
        b.subscribe(
            pos,
            Subscription::Free {
                slot,
                face: BlockFace::Top,
                edge: None,
            },
        );
        if let Some(sky) = sky {
            safety(b, slot, pos, false, [sky, sky.left_side(), sky.right_side()]);
        }
    }

    // Floor, and where to place it from if it is missing.
    let floor = target.sub(0, 1, 0);
    b.subscribe(floor, Subscription::Solid);
    if let (true, Some(sky)) = (allow_block_actions, sky) {
        b.subscribe(floor.sub(0, 1, 0), Subscription::AgainstPlace { face: BlockFace::Top });
        b.subscribe(
            sky.offset(floor),
            Subscription::AgainstPlace {
                face: sky.opposite().to_block_face(),
            },
        );
        // Scaffolding from the block we stand on only works on the flat.
        if modifier == MovementModifier::Normal {
            b.subscribe(
                sky.opposite().offset(floor),
                Subscription::AgainstPlace {
                    face: sky.to_block_face(),
                },
            );
        }
        b.subscribe(
            sky.left_side().offset(floor),
            Subscription::AgainstPlace {
                face: sky.right_side().to_block_face(),
            },
        );
        b.subscribe(
            sky.right_side().offset(floor),
            Subscription::AgainstPlace {
                face: sky.left_side().to_block_face(),
            },
        );
    }
}

fn register_parkour(b: &mut TemplateBuilder, direction: ParkourDirection) {
    let sky = direction.to_sky();
    let one = sky.offset(Vec3i::ZERO);
    let two = sky.offset(one);
    b.begin(
        MovementKind::Parkour { direction },
        ActionDirection::Horizontal(direction.to_movement()),
        two,
        ONE_GAP_JUMP,
    );
    let face = opposite_face(sky);
    b.subscribe(
        Vec3i::new(0, 2, 0),
        Subscription::Free {
            slot: 0,
            face: BlockFace::Bottom,
            edge: None,
        },
    );
    let mut slot = 1;
    for column in [one, two] {
        for dy in 0..3 {
            b.subscribe(
                column.add(0, dy, 0),
                Subscription::Free {
                    slot,
                    face,
                    edge: None,
                },
            );
            slot += 1;
        }
    }
    b.subscribe(one.sub(0, 1, 0), Subscription::ParkourGap);
    b.subscribe(two.sub(0, 1, 0), Subscription::Solid);
}

fn register_down(b: &mut TemplateBuilder) {
    b.begin(MovementKind::Down, ActionDirection::Down, Vec3i::new(0, -1, 0), 0.0);
    let dig = Vec3i::new(0, -1, 0);
    b.subscribe(
        dig,
        Subscription::Free {
            slot: 0,
            face: BlockFace::Top,
            edge: None,
        },
    );
    for dir in SkyDirection::ALL {
        b.subscribe(
            dir.offset(dig),
            Subscription::BreakSafety {
                slot: 0,
                kind: SafetyKind::Fluids,
            },
        );
    }
    for dy in [-2, -3, -4] {
        b.subscribe(Vec3i::new(0, dy, 0), Subscription::DownLanding);
    }
    for dy in [-2, -3] {
        b.subscribe(Vec3i::new(0, dy, 0), Subscription::DownObstruct);
    }
}

fn register_up(b: &mut TemplateBuilder) {
    b.begin(MovementKind::Up, ActionDirection::Up, Vec3i::new(0, 1, 0), 0.0);
    let head = Vec3i::new(0, 2, 0);
    b.subscribe(
        head,
        Subscription::Free {
            slot: 0,
            face: BlockFace::Bottom,
            edge: None,
        },
    );
    b.subscribe(
        head.add(0, 1, 0),
        Subscription::BreakSafety {
            slot: 0,
            kind: SafetyKind::FallingAndFluids,
        },
    );
    for dir in SkyDirection::ALL {
        b.subscribe(
            dir.offset(head),
            Subscription::BreakSafety {
                slot: 0,
                kind: SafetyKind::Fluids,
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Frozen movement templates and their offset subscription tables.
#[derive(Clone, Debug)]
pub struct ActionRegistry {
    templates: Box<[ActionTemplate]>,
    keys: Box<[Vec3i]>,
    subscribers: Box<[Box<[Subscriber]>]>,
}

impl ActionRegistry {
    /// Register every movement family and freeze the tables.
    pub fn build() -> Self {
        let mut b = TemplateBuilder::new();
        for direction in MovementDirection::ALL {
            for modifier in MovementModifier::ALL {
                if direction.is_diagonal() {
                    for side in MovementSide::ALL {
                        register_simple(&mut b, direction, Some(side), modifier);
                    }
                } else {
                    register_simple(&mut b, direction, None, modifier);
                }
            }
        }
        for direction in ParkourDirection::ALL {
            register_parkour(&mut b, direction);
        }
        register_down(&mut b);
        register_up(&mut b);
        b.finish()
    }

    pub fn templates(&self) -> &[ActionTemplate] {
        &self.templates
    }

    pub fn template(&self, action: u16) -> &ActionTemplate {
        &self.templates[action as usize]
    }

    /// Offsets in evaluation order (descending fan-out).
    pub fn keys(&self) -> &[Vec3i] {
        &self.keys
    }

    /// Subscribers of `keys()[index]`.
    pub fn subscribers(&self, index: usize) -> &[Subscriber] {
        &self.subscribers[index]
    }

    /// `(offset, subscribers)` in evaluation order.
    pub fn entries(&self) -> impl Iterator<Item = (Vec3i, &[Subscriber])> {
        self.keys
            .iter()
            .copied()
            .zip(self.subscribers.iter().map(|s| &**s))
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::build()
    }
}
