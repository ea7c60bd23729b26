//! Shared contracts, targets and wire helpers for crate tests.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use shuttle_wire::{
    BinaryWire, JsonWire, ObjectType, ValueIn, ValueOut, WireError, WireIn, WireObject, WireOut,
    WireType,
};

use crate::{
    ContractSpec, DispatchError, MethodFilterOnFirstArg, NumericConversion, OperationSpec,
    Parameter, Returned, Target, TargetSpec, Value,
};

/// Account whose transfers the trading desk ignores.
pub(crate) const BLOCKED_ACCOUNT: i32 = 42;

/// Calls recorded by the trading targets, shared with their chain results.
pub(crate) type Journal = Rc<RefCell<Vec<String>>>;

// ---------------------------------------------------------------------------
// Objects
// ---------------------------------------------------------------------------

/// Small object argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Point {
    pub(crate) x: i32,
    pub(crate) y: i32,
}

impl WireObject for Point {
    fn read_fields(&mut self, input: &mut dyn ValueIn) -> Result<(), WireError> {
        self.x = input.int32()?;
        self.y = input.int32()?;
        Ok(())
    }

    fn write_fields(&self, out: &mut dyn ValueOut) {
        out.int32(self.x);
        out.int32(self.y);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

pub(crate) trait Desk {
    fn ping(&mut self);
    fn transfer(&mut self, account: i32, amount: i64, memo: &str);
    fn reference(&mut self, code: i64);
    fn mark(&mut self, point: &Point);
    fn begin(&mut self, trader: &str) -> Box<dyn Blotter>;
    fn halt(&mut self) -> Result<(), String>;
}

pub(crate) trait Blotter {
    fn trader(&self) -> &str;
    fn ticket(&mut self, id: i64) -> Box<dyn Ticket>;
}

pub(crate) trait Ticket {
    fn id(&self) -> i64;
    fn fill(&mut self, quantity: i32, price: f64);
}

pub(crate) fn desk_contract() -> ContractSpec<dyn Desk> {
    ContractSpec::new("Desk")
        .operation(
            OperationSpec::<dyn Desk>::new("ping", |desk, _| {
                desk.ping();
                Ok(())
            })
            .method_id(1),
        )
        .operation(
            OperationSpec::<dyn Desk>::new("transfer", |desk, args| {
                desk.transfer(args.int32(0)?, args.int64(1)?, args.text(2)?);
                Ok(())
            })
            .param(Parameter::int32("account"))
            .param(Parameter::int64("amount"))
            .param(Parameter::text("memo"))
            .method_id(2),
        )
        .operation(
            OperationSpec::<dyn Desk>::new("reference", |desk, args| {
                desk.reference(args.int64(0)?);
                Ok(())
            })
            .param(Parameter::int64("code").converted(NumericConversion::base95())),
        )
        .operation(
            OperationSpec::<dyn Desk>::new("mark", |desk, args| {
                desk.mark(args.object::<Point>(0)?);
                Ok(())
            })
            .param(Parameter::object("point", ObjectType::of::<Point>())),
        )
        .operation(
            OperationSpec::<dyn Desk>::new("begin", |desk, args| {
                Ok(Returned::chained(desk.begin(args.text(0)?)))
            })
            .param(Parameter::text("trader"))
            .chains_to(blotter_contract),
        )
        .operation(OperationSpec::<dyn Desk>::new("halt", |desk, args| {
            desk.halt()
                .map_err(|message| DispatchError::target(args.operation(), message))
        }))
}

pub(crate) fn blotter_contract() -> ContractSpec<dyn Blotter> {
    ContractSpec::new("Blotter").operation(
        OperationSpec::<dyn Blotter>::new("ticket", |blotter, args| {
            Ok(Returned::chained(blotter.ticket(args.int64(0)?)))
        })
        .param(Parameter::int64("id"))
        .chains_to(ticket_contract),
    )
}

pub(crate) fn ticket_contract() -> ContractSpec<dyn Ticket> {
    ContractSpec::new("Ticket").operation(
        OperationSpec::<dyn Ticket>::new("fill", |ticket, args| {
            ticket.fill(args.int32(0)?, args.float64(1)?);
            Ok(())
        })
        .param(Parameter::int32("quantity"))
        .param(Parameter::float64("price")),
    )
}

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Target implementing [`Desk`] and filtering blocked accounts.
#[derive(Debug, Default)]
pub(crate) struct TradingDesk {
    pub(crate) journal: Journal,
    pub(crate) marks: Vec<Point>,
}

impl TradingDesk {
    pub(crate) fn with_journal(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            marks: Vec::new(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    fn record(&self, call: String) {
        self.journal.borrow_mut().push(call);
    }
}

impl Desk for TradingDesk {
    fn ping(&mut self) {
        self.record(String::from("ping"));
    }

    fn transfer(&mut self, account: i32, amount: i64, memo: &str) {
        self.record(format!("transfer {account} {amount} {memo}"));
    }

    fn reference(&mut self, code: i64) {
        self.record(format!("reference {code}"));
    }

    fn mark(&mut self, point: &Point) {
        self.marks.push(point.clone());
        self.record(format!("mark {} {}", point.x, point.y));
    }

    fn begin(&mut self, trader: &str) -> Box<dyn Blotter> {
        self.record(format!("begin {trader}"));
        Box::new(TraderBlotter {
            journal: Rc::clone(&self.journal),
            trader: trader.to_owned(),
        })
    }

    fn halt(&mut self) -> Result<(), String> {
        Err(String::from("desk is closed"))
    }
}

impl MethodFilterOnFirstArg for TradingDesk {
    fn ignore_method_based_on_first_arg(&mut self, operation: &str, first_arg: &Value) -> bool {
        operation == "transfer" && first_arg.as_int32() == Some(BLOCKED_ACCOUNT)
    }
}

impl Target for TradingDesk {
    fn describe(spec: &mut TargetSpec<Self>) {
        spec.implements(desk_contract(), |desk| desk)
            .filter_on_first_arg();
    }
}

struct TraderBlotter {
    journal: Journal,
    trader: String,
}

impl Blotter for TraderBlotter {
    fn trader(&self) -> &str {
        &self.trader
    }

    fn ticket(&mut self, id: i64) -> Box<dyn Ticket> {
        self.journal
            .borrow_mut()
            .push(format!("ticket {id} by {}", self.trader));
        Box::new(OpenTicket {
            journal: Rc::clone(&self.journal),
            id,
        })
    }
}

struct OpenTicket {
    journal: Journal,
    id: i64,
}

impl Ticket for OpenTicket {
    fn id(&self) -> i64 {
        self.id
    }

    fn fill(&mut self, quantity: i32, price: f64) {
        self.journal
            .borrow_mut()
            .push(format!("fill {quantity}@{price} on {}", self.id));
    }
}

// ---------------------------------------------------------------------------
// Wire helpers
// ---------------------------------------------------------------------------

/// Messages written on one wire type.
pub(crate) enum Messages {
    Binary(BinaryWire),
    Json(JsonWire),
}

impl Messages {
    pub(crate) const fn new(wire_type: WireType) -> Self {
        match wire_type {
            WireType::Binary => Self::Binary(BinaryWire::new()),
            WireType::Json => Self::Json(JsonWire::new()),
        }
    }

    pub(crate) const fn wire_type(&self) -> WireType {
        match self {
            Self::Binary(_) => WireType::Binary,
            Self::Json(_) => WireType::Json,
        }
    }

    pub(crate) fn out(&mut self) -> &mut dyn WireOut {
        match self {
            Self::Binary(wire) => wire,
            Self::Json(wire) => wire,
        }
    }

    pub(crate) fn reader(&self) -> Box<dyn WireIn + '_> {
        match self {
            Self::Binary(wire) => Box::new(wire.reader()),
            Self::Json(wire) => Box::new(wire.reader()),
        }
    }

    /// Writes `transfer(account, amount, memo)`.
    pub(crate) fn transfer(&mut self, account: i32, amount: i64, memo: &str) {
        self.out().write_named("transfer", &mut |out| {
            out.sequence(&mut |args| {
                args.int32(account);
                args.int64(amount);
                args.text(memo);
            });
        });
    }

    /// Writes `reference(code)`, as text on textual wires.
    pub(crate) fn reference(&mut self, code: &str, value: i64) {
        let textual = self.wire_type().is_textual();
        self.out().write_named("reference", &mut |out| {
            if textual {
                out.text(code);
            } else {
                out.int64(value);
            }
        });
    }

    /// Writes the chain `begin(trader).ticket(id).fill(quantity, price)`.
    pub(crate) fn trade(&mut self, trader: &str, id: i64, quantity: i32, price: f64) {
        let out = self.out();
        out.write_named("begin", &mut |value| value.text(trader));
        out.write_named("ticket", &mut |value| value.int64(id));
        out.write_named("fill", &mut |value| {
            value.sequence(&mut |args| {
                args.int32(quantity);
                args.float64(price);
            });
        });
    }

    /// Writes a call with no arguments.
    pub(crate) fn call(&mut self, name: &str) {
        self.out().write_named(name, &mut |out| out.empty());
    }
}
