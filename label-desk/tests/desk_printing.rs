// label-desk/tests/desk_printing.rs
// Queue printing through the desk

use label_desk::{
    BarcodeLabel, BridgeSlot, LabelConfig, LabelDesk, LabelSource, MSG_NO_ITEMS,
    MSG_PRINT_IN_PROGRESS, MemoryBridge, PrinterConnectionManager, QueueError,
};
use std::sync::Arc;
use std::time::Duration;
use tspl_printer::LabelResult;

fn desk_over(bridge: &Arc<MemoryBridge>) -> LabelDesk {
    let manager = PrinterConnectionManager::new(BridgeSlot::Available(bridge.clone()));
    LabelDesk::new(manager, &LabelConfig::default())
}

fn label(barcode: &str, name: &str, price: &str) -> BarcodeLabel {
    BarcodeLabel::new(barcode)
        .unwrap()
        .with_product_name(name)
        .with_price(price)
}

#[tokio::test(start_paused = true)]
async fn test_print_all_sends_flattened_queue_and_clears() {
    let bridge = Arc::new(MemoryBridge::new());
    let desk = desk_over(&bridge);

    desk.add_to_queue(label("1001", "Kurti", "899"), 1).unwrap();
    desk.add_to_queue(label("1002", "Dupatta", "499"), 2).unwrap();
    desk.add_to_queue(label("1003", "Saree", "2499"), 1).unwrap();
    assert_eq!(desk.total_labels(), 4);
    assert_eq!(desk.total_strips(), 2);

    let result = desk.print_all().await;
    assert!(result.success);
    assert_eq!(result.message, "Printed 4 label(s) on 2 strip(s)!");
    assert_eq!(desk.queue_len(), 0);

    let jobs = bridge.jobs();
    assert_eq!(jobs.len(), 1);
    let commands = &jobs[0].commands;
    assert_eq!(commands.matches("CLS\r\n").count(), 2);
    assert_eq!(commands.matches("PRINT 1\r\n").count(), 2);
    let barcodes: Vec<&str> = commands
        .split("\r\n")
        .filter(|l| l.starts_with("BARCODE "))
        .filter_map(|l| l.rsplit(',').next())
        .collect();
    assert_eq!(barcodes, ["\"1001\"", "\"1002\"", "\"1002\"", "\"1003\""]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_print_keeps_queue() {
    let bridge = Arc::new(MemoryBridge::new().failing_dispatch("printer offline"));
    let desk = desk_over(&bridge);
    desk.add_to_queue(label("1001", "Kurti", "899"), 3).unwrap();

    let result = desk.print_all().await;
    assert!(!result.success);
    assert!(result.message.starts_with("Print failed: "));
    assert_eq!(desk.total_labels(), 3);
    assert!(!desk.is_printing());
}

#[tokio::test(start_paused = true)]
async fn test_merge_clamps_through_desk() {
    let bridge = Arc::new(MemoryBridge::new());
    let desk = desk_over(&bridge);

    desk.add_to_queue(label("1001", "Kurti", "899"), 95).unwrap();
    assert_eq!(desk.add_to_queue(label("1001", "Kurti", "899"), 10), Ok(100));
    assert_eq!(desk.adjust_copies(&"1001".to_string(), -150), Ok(Some(1)));
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_print_all_rejected_and_queue_locked() {
    // slow start keeps the first print in flight
    let bridge = Arc::new(MemoryBridge::new().with_start_delay(Duration::from_secs(2)));
    let desk = desk_over(&bridge);
    desk.add_to_queue(label("1001", "Kurti", "899"), 2).unwrap();

    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(desk.is_printing());
        assert_eq!(
            desk.add_to_queue(label("1002", "Dupatta", "499"), 1),
            Err(QueueError::Busy)
        );
        assert_eq!(desk.clear_queue(), Err(QueueError::Busy));
        desk.print_all().await
    };

    let (first, second) = tokio::join!(desk.print_all(), second);

    assert!(first.success);
    assert!(!second.success);
    assert_eq!(second.message, MSG_PRINT_IN_PROGRESS);
    assert_eq!(bridge.jobs().len(), 1);
    assert!(!desk.is_printing());

    // unlocked again once the print finished
    desk.add_to_queue(label("1002", "Dupatta", "499"), 1).unwrap();
    assert_eq!(desk.queue_len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_print_single_refused_while_queue_prints() {
    let bridge = Arc::new(MemoryBridge::new().with_start_delay(Duration::from_secs(2)));
    let desk = desk_over(&bridge);
    desk.add_to_queue(label("1001", "Kurti", "899"), 1).unwrap();

    let single = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        desk.print_single(&label("2001", "Stole", "349"), 1).await
    };
    let (queued, single) = tokio::join!(desk.print_all(), single);

    assert!(queued.success);
    assert_eq!(single.message, MSG_PRINT_IN_PROGRESS);
    assert!(!single.success);
    assert_eq!(bridge.jobs().len(), 1);

    let single = desk.print_single(&label("2001", "Stole", "349"), 2).await;
    assert!(single.success);
    assert_eq!(single.message, "Printed 2 label(s) on 1 strip(s)!");
    assert_eq!(bridge.jobs().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_empty_queue_reports_no_items() {
    let bridge = Arc::new(MemoryBridge::new());
    let desk = desk_over(&bridge);
    let result = desk.print_all().await;
    assert!(!result.success);
    assert_eq!(result.message, MSG_NO_ITEMS);
}

#[derive(Debug, Clone)]
struct Product {
    id: u32,
    barcode: String,
    name: String,
    price: f64,
}

impl LabelSource for Product {
    type Id = u32;

    fn source_id(&self) -> u32 {
        self.id
    }

    fn to_label(&self) -> LabelResult<BarcodeLabel> {
        Ok(BarcodeLabel::new(self.barcode.clone())?
            .with_product_name(self.name.clone())
            .with_price(format!("{}", self.price)))
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_source_and_label_error() {
    let bridge = Arc::new(MemoryBridge::new());
    let manager = PrinterConnectionManager::new(BridgeSlot::Available(bridge.clone()));
    let desk: LabelDesk<Product> = LabelDesk::new(manager, &LabelConfig::default());

    let saree = Product {
        id: 7,
        barcode: "8901234".into(),
        name: "Silk Saree".into(),
        price: 2499.0,
    };
    desk.add_to_queue(saree.clone(), 1).unwrap();
    desk.add_to_queue(saree, 1).unwrap();
    assert_eq!(desk.queue_len(), 1);

    let missing = Product {
        id: 8,
        barcode: String::new(),
        name: "Unlabelled".into(),
        price: 10.0,
    };
    desk.add_to_queue(missing, 1).unwrap();

    let result = desk.print_all().await;
    assert!(!result.success);
    assert!(bridge.jobs().is_empty());
    assert_eq!(desk.total_labels(), 3);

    desk.remove_from_queue(&8).unwrap();
    let result = desk.print_all().await;
    assert!(result.success);
    assert!(bridge.jobs()[0].commands.contains("\"Rs.2499\""));
}
