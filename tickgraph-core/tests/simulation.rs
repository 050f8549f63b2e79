//! Integration Tests for Sheet Simulations
//!
//! These tests build small inventory models on a sheet and check that the
//! result does not depend on the order the cells were written in.

use tickgraph_core::input::InventoryInput;
use tickgraph_core::sheet::Sheet;
use tickgraph_core::task::Combinator;
use tickgraph_core::ticks::{Date, Tick};
use tickgraph_core::Result;

const ARRIVALS: [f64; 5] = [10.0, 20.0, 30.0, 20.0, 10.0];
const SHIPMENTS: [f64; 5] = [20.0, 20.0, 20.0, 20.0, 20.0];
const ROWS: [&str; 4] = ["opening", "arrivals", "shipments", "closing"];

fn period() -> (Date, Date) {
    let start = Date::from_ymd(2022, 5, 30).unwrap();
    (start, start + 4)
}

fn set_closing(sheet: &mut Sheet<Date>, day: Date) -> Result<()> {
    let opening = sheet.get("opening", day)?;
    let arrivals = sheet.get("arrivals", day)?;
    let shipments = sheet.get("shipments", day)?;
    let graph = sheet.graph_mut();
    let gross = graph.add(opening, arrivals);
    let net = graph.sub(gross, shipments);
    sheet.set("closing", day, net)
}

fn set_inputs(sheet: &mut Sheet<Date>, day: Date) -> Result<()> {
    let i = day.since(sheet.start()) as usize;
    sheet.set("arrivals", day, ARRIVALS[i])?;
    sheet.set("shipments", day, SHIPMENTS[i])
}

fn carry_over(sheet: &mut Sheet<Date>, day: Date) -> Result<()> {
    let previous = sheet.get("closing", day - 1)?;
    sheet.set("opening", day, previous)
}

fn closing_row(sheet: &Sheet<Date>) -> Vec<Option<f64>> {
    sheet
        .row("closing")
        .unwrap()
        .iter()
        .map(|cell| cell.result(sheet.graph()))
        .collect()
}

fn expected() -> Vec<Option<f64>> {
    vec![Some(90.0), Some(90.0), Some(100.0), Some(100.0), Some(90.0)]
}

/// Test the model written day by day, inputs first.
#[test]
fn inventory_forward() {
    let (start, end) = period();
    let mut sheet = Sheet::new(start, end, ROWS).unwrap();
    sheet.set("opening", start, 100).unwrap();

    for day in sheet.columns() {
        set_inputs(&mut sheet, day).unwrap();
        if day > start {
            carry_over(&mut sheet, day).unwrap();
        }
        set_closing(&mut sheet, day).unwrap();
    }

    sheet.calculate().unwrap();
    assert_eq!(closing_row(&sheet), expected());
}

/// Test the model written day by day, formulas before the inputs they read.
#[test]
fn inventory_formulas_first() {
    let (start, end) = period();
    let mut sheet = Sheet::new(start, end, ROWS).unwrap();
    sheet.set("opening", start, 100).unwrap();

    for day in sheet.columns() {
        set_closing(&mut sheet, day).unwrap();
        if day > start {
            carry_over(&mut sheet, day).unwrap();
        }
        set_inputs(&mut sheet, day).unwrap();
    }

    sheet.calculate().unwrap();
    assert_eq!(closing_row(&sheet), expected());
}

/// Test the model written one row at a time.
#[test]
fn inventory_row_by_row() {
    let (start, end) = period();
    let mut sheet = Sheet::new(start, end, ROWS).unwrap();

    for day in sheet.columns() {
        set_closing(&mut sheet, day).unwrap();
    }
    sheet.set("opening", start, 100).unwrap();
    for day in sheet.columns().into_iter().skip(1) {
        carry_over(&mut sheet, day).unwrap();
    }
    for day in sheet.columns() {
        set_inputs(&mut sheet, day).unwrap();
    }

    sheet.calculate().unwrap();
    assert_eq!(closing_row(&sheet), expected());

    // Every closing cell feeds the next day's opening, except the last
    let children = sheet.child_cells("closing", start).unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].row(), "opening");
    assert_eq!(children[0].column(), start + 1);
    assert!(sheet.child_cells("closing", end).unwrap().is_empty());
}

/// Test the model built from JSON input, then updated in place.
#[test]
fn inventory_from_input_with_update() {
    let input = InventoryInput::from_json(
        r#"{
            "opening_inventory": 100,
            "shipments": [20, 20, 20, 20, 20],
            "arrivals": [10, 20, 30, 20, 10]
        }"#,
    )
    .unwrap();
    let (start, end) = period();

    let mut sheet = input.build_sheet(start, end).unwrap();
    sheet.calculate().unwrap();
    assert_eq!(closing_row(&sheet), expected());

    // A larger delivery on day 3 raises every closing from day 3 onward
    let affected = sheet.update("arrivals", start + 2, 50.0).unwrap();
    assert_eq!(affected.len(), 1 + 3 + 2);
    assert_eq!(
        closing_row(&sheet),
        vec![Some(90.0), Some(90.0), Some(120.0), Some(120.0), Some(110.0)]
    );

    let tsv = sheet.to_tsv();
    let mut lines = tsv.lines();
    assert_eq!(
        lines.next(),
        Some("\t2022-05-30\t2022-05-31\t2022-06-01\t2022-06-02\t2022-06-03")
    );
    assert_eq!(lines.last(), Some("closing\t90\t90\t120\t120\t110"));
}

/// Test a reorder-point model where orders arrive the next day.
#[test]
fn reorder_point_simulation() {
    let start = Date::from_ymd(2022, 1, 1).unwrap();
    let end = start + 5;
    let rows = ["start_inv", "end_inv", "order", "sales", "arrive"];
    let mut sheet = Sheet::new(start, end, rows).unwrap();

    let sales = [4.0, 6.0, 5.0, 2.0, 7.0, 3.0];
    let order_rule = Combinator::new("order_rule", |inv_end: f64| {
        if inv_end <= 3.0 {
            5.0
        } else {
            0.0
        }
    });
    let calc_inv = Combinator::new("calc_inv", |inv: f64, sold: f64, arrived: f64| {
        (inv - sold + arrived).max(0.0)
    });

    let ten = sheet.graph_mut().constant(10.0);
    let opening = sheet.graph_mut().add(ten, ten);
    sheet.set("start_inv", start, opening).unwrap();
    sheet.set("arrive", start, 0).unwrap();

    for (i, day) in sheet.columns().into_iter().enumerate() {
        sheet.set("sales", day, sales[i]).unwrap();
        if day > start {
            let ordered = sheet.get("order", day - 1).unwrap();
            sheet.set("arrive", day, ordered).unwrap();
        }

        let operands = (
            sheet.get("start_inv", day).unwrap(),
            sheet.get("sales", day).unwrap(),
            sheet.get("arrive", day).unwrap(),
        );
        let inv_end = calc_inv.apply(sheet.graph_mut(), operands);
        sheet.set("end_inv", day, inv_end).unwrap();

        let closing = sheet.get("end_inv", day).unwrap();
        let order = order_rule.apply(sheet.graph_mut(), (closing,));
        sheet.set("order", day, order).unwrap();

        if day < end {
            sheet.set("start_inv", day + 1, closing).unwrap();
        }
    }

    sheet.calculate().unwrap();

    // 20 -4 = 16, -6 = 10, -5 = 5, -2 = 3 (order 5), -7 +5 = 1 (order 5), -3 +5 = 3
    let end_inv: Vec<_> = sheet
        .row("end_inv")
        .unwrap()
        .iter()
        .map(|cell| cell.result(sheet.graph()).unwrap())
        .collect();
    assert_eq!(end_inv, vec![16.0, 10.0, 5.0, 3.0, 1.0, 3.0]);
    assert_eq!(sheet.result("order", end).unwrap(), Some(5.0));
}
