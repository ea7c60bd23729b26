//! Unit tests for contract descriptors and their erased form.

use rstest::{fixture, rstest};

use super::*;
use crate::value::Value;

trait Ledger {
    fn entries(&self) -> usize;
    fn clear(&mut self);
}

trait Account: Ledger {
    fn deposit(&mut self, amount: i64);
}

trait Statement {
    fn lines(&self) -> usize;
}

#[derive(Default)]
struct Book {
    deposits: Vec<i64>,
}

impl Ledger for Book {
    fn entries(&self) -> usize {
        self.deposits.len()
    }

    fn clear(&mut self) {
        self.deposits.clear();
    }
}

impl Account for Book {
    fn deposit(&mut self, amount: i64) {
        self.deposits.push(amount);
    }
}

struct Printed(usize);

impl Statement for Printed {
    fn lines(&self) -> usize {
        self.0
    }
}

fn ledger_contract() -> ContractSpec<dyn Ledger> {
    ContractSpec::new("Ledger").operation(OperationSpec::<dyn Ledger>::new("clear", |ledger, _| {
        ledger.clear();
        Ok(())
    }))
}

fn statement_contract() -> ContractSpec<dyn Statement> {
    ContractSpec::new("Statement").operation(OperationSpec::<dyn Statement>::new(
        "lines",
        |statement, _| {
            let _lines = statement.lines();
            Ok(())
        },
    ))
}

fn account_contract() -> ContractSpec<dyn Account> {
    ContractSpec::new("Account")
        .operation(
            OperationSpec::<dyn Account>::new("deposit", |account, args| {
                account.deposit(args.int64(0)?);
                Ok(())
            })
            .param(Parameter::int64("amount"))
            .method_id(7),
        )
        .operation(
            OperationSpec::<dyn Account>::new("statement", |account, _| {
                Ok(Returned::chained::<dyn Statement>(Box::new(Printed(
                    account.entries(),
                ))))
            })
            .chains_to(statement_contract),
        )
        .operation(OperationSpec::<dyn Account>::new("hash_code", |_, _| Ok(())).universal())
        .extends(ledger_contract(), |account| account)
}

#[fixture]
fn erased_account() -> ErasedContract {
    let receiver = Receiver::<dyn Account>::new(|any| {
        any.downcast_mut::<Book>()
            .map(|book| book as &mut dyn Account)
    });
    account_contract().erase(&receiver)
}

fn operation<'a>(contract: &'a ErasedContract, name: &str) -> &'a ErasedOperation {
    contract
        .operations
        .iter()
        .chain(contract.parents.iter().flat_map(|parent| parent.operations.iter()))
        .find(|operation| operation.name == name)
        .expect("operation present")
}

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

#[test]
fn builder_records_operation_metadata() {
    let spec = account_contract();
    let names: Vec<_> = spec.operations().iter().map(OperationSpec::name).collect();
    assert_eq!(names, ["deposit", "statement", "hash_code"]);

    let deposit = spec.operations().first().expect("deposit");
    assert_eq!(deposit.params().len(), 1);
    assert_eq!(deposit.method_id, Some(7));
}

#[rstest]
fn erased_contract_keeps_parents_and_origins(erased_account: ErasedContract) {
    assert_eq!(erased_account.name, "Account");
    assert!(erased_account.chainable);
    assert_eq!(erased_account.parents.len(), 1);
    assert_eq!(
        erased_account.parents.first().map(|parent| parent.name),
        Some("Ledger")
    );
    assert_eq!(
        operation(&erased_account, "hash_code").origin,
        Origin::Universal
    );
    assert!(operation(&erased_account, "statement").chain.is_some());
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

#[rstest]
fn erased_operation_reaches_the_concrete_target(erased_account: ErasedContract) {
    let mut book = Book::default();
    let mut values = vec![Value::Int64(250)];

    let deposit = operation(&erased_account, "deposit");
    let returned = (deposit.invoke)(&mut book, &mut CallArgs::new("deposit", &mut values))
        .expect("deposit succeeds");

    assert!(!returned.is_chained());
    assert_eq!(book.deposits, [250]);
}

#[rstest]
fn parent_operation_is_upcast_from_the_child_receiver(erased_account: ErasedContract) {
    let mut book = Book {
        deposits: vec![1, 2],
    };
    let clear = operation(&erased_account, "clear");
    (clear.invoke)(&mut book, &mut CallArgs::new("clear", &mut [])).expect("clear succeeds");
    assert!(book.deposits.is_empty());
}

#[rstest]
fn foreign_receiver_is_a_mismatch(erased_account: ErasedContract) {
    let mut wrong = String::from("not a book");
    let mut values = vec![Value::Int64(1)];
    let deposit = operation(&erased_account, "deposit");

    let err = (deposit.invoke)(&mut wrong, &mut CallArgs::new("deposit", &mut values))
        .expect_err("string is not an account");
    assert!(matches!(err, DispatchError::ReceiverMismatch { operation: name } if name == "deposit"));
}

#[rstest]
fn chained_result_is_boxed_for_the_chained_contract(erased_account: ErasedContract) {
    let mut book = Book {
        deposits: vec![5, 6, 7],
    };
    let statement = operation(&erased_account, "statement");
    let returned = (statement.invoke)(&mut book, &mut CallArgs::new("statement", &mut []))
        .expect("statement succeeds");

    let lines = returned
        .chained_ref::<dyn Statement>()
        .map(Statement::lines);
    assert_eq!(lines, Some(3));
}

#[rstest]
fn chain_link_erases_against_the_result_slot(erased_account: ErasedContract) {
    let link = operation(&erased_account, "statement")
        .chain
        .clone()
        .expect("chain link");
    assert_eq!(link.id(), TypeId::of::<dyn Statement>());

    let chained = link.contract();
    assert_eq!(chained.name, "Statement");

    let mut slot: Box<dyn Any> = Box::new(Box::new(Printed(2)) as Box<dyn Statement>);
    let lines = chained.operations.first().expect("lines");
    (lines.invoke)(slot.as_mut(), &mut CallArgs::new("lines", &mut []))
        .expect("chained receiver resolves");
}

#[test]
fn not_chainable_is_carried_into_erased_form() {
    let erased = statement_contract()
        .not_chainable()
        .erase(&Receiver::<dyn Statement>::chained());
    assert!(!erased.chainable);
}
