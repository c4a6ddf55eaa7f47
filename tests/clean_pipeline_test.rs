use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bill_cleaner::app::clean_use_case::{CleanOutcome, CleanStats, CleanUseCase};
use bill_cleaner::app::ports::DiagnosticKind;
use bill_cleaner::infra::diagnostics_adapter::MemoryDiagnostics;
use bill_cleaner::infra::normalize_output_adapter::CsvLedgerOutputAdapter;
use bill_cleaner::pipeline::ingestion::SourceEncoding;
use bill_cleaner::pipeline::processing::platforms::{AlipayProfile, PlatformProfile, WechatProfile};
use bill_cleaner::pipeline::processing::FieldResolution;
use bill_cleaner::CanonicalField;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook};
use tempfile::tempdir;

const ALIPAY_EXPORT: &str = "支付宝交易记录明细查询\n\
账号:[user@example.com]\n\
起始日期:[2024-01-01 00:00:00]    终止日期:[2024-02-01 00:00:00]\n\
交易时间,交易类型,交易对方,商品说明,收/支,金额,交易状态\n\
2024-01-05 18:30:00,消费,超市,日用品,支出,\"¥1,234.56\",交易成功\n\
2024-01-02 09:15:00,转账,李四,转账,收入,500.00,交易成功\n\
,,,,,,\n\
2024-01-05 18:30:00,消费,超市,日用品,支出,\"¥1,234.56\",交易成功\n\
2024-01-03 12:00:00,消费,面馆,午餐,支出,25.00,交易成功\n";

fn clean(profile: &dyn PlatformProfile, input: &Path, output_dir: &Path) -> (CleanOutcome, MemoryDiagnostics) {
    let sink = MemoryDiagnostics::new();
    let use_case = CleanUseCase::new(Arc::new(sink.clone()), Box::new(CsvLedgerOutputAdapter::new()));
    (use_case.clean_file(profile, input, output_dir), sink)
}

fn expect_success(outcome: CleanOutcome) -> CleanStats {
    match outcome {
        CleanOutcome::Success(stats) => stats,
        CleanOutcome::Failed { error, .. } => panic!("clean failed: {}", error),
    }
}

fn read_output(path: &Path) -> String {
    let text = fs::read_to_string(path).unwrap();
    text.strip_prefix('\u{FEFF}').expect("output starts with a BOM").to_string()
}

#[test]
fn test_alipay_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alipay_record_202401.csv");
    fs::write(&input, ALIPAY_EXPORT).unwrap();
    let output_dir = dir.path().join("output");

    let (outcome, _) = clean(&AlipayProfile::new(), &input, &output_dir);
    let stats = expect_success(outcome);

    assert_eq!(stats.header_offset, 3);
    assert!(stats.header_found);
    assert_eq!(stats.original_rows, 5);
    assert_eq!(stats.final_rows, 3);
    assert_eq!(stats.cleaned_rows, 1);
    assert_eq!(stats.deduplicated_rows, 1);
    assert_eq!(stats.income_total, Decimal::from(500));
    assert_eq!(stats.expense_total, Decimal::from_str("1259.56").unwrap());
    assert_eq!(
        stats.output_file,
        output_dir.join("alipay_alipay_record_202401_processed.csv")
    );

    let text = read_output(&stats.output_file);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "transaction_time,counterparty,amount,direction,product_name,platform,交易类型,交易状态",
            "2024-01-02 09:15:00,李四,500.00,income,转账,alipay,转账,交易成功",
            "2024-01-03 12:00:00,面馆,25.00,expense,午餐,alipay,消费,交易成功",
            "2024-01-05 18:30:00,超市,1234.56,expense,日用品,alipay,消费,交易成功",
        ]
    );
}

#[test]
fn test_gbk_export_is_detected_and_decoded() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alipay_gbk.csv");
    let content = ALIPAY_EXPORT.replace('¥', "￥");
    let (bytes, _, unmappable) = encoding_rs::GBK.encode(&content);
    assert!(!unmappable);
    fs::write(&input, &bytes).unwrap();

    let (outcome, _) = clean(&AlipayProfile::new(), &input, dir.path());
    let stats = expect_success(outcome);

    assert_eq!(stats.encoding, Some(SourceEncoding::Gbk));
    assert_eq!(stats.final_rows, 3);
    assert!(read_output(&stats.output_file).contains("超市,1234.56,expense"));
}

#[test]
fn test_missing_counterparty_column_yields_null_field() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("微信支付账单(202401).csv");
    fs::write(
        &input,
        "交易时间,交易类型,商品,收/支,金额(元)\n\
         2024-01-01 08:00:00,商户消费,早餐,支出,¥6.50\n",
    )
    .unwrap();

    let (outcome, sink) = clean(&WechatProfile::new(), &input, dir.path());
    let stats = expect_success(outcome);

    assert_eq!(
        stats.reconciliation.get(CanonicalField::Counterparty),
        Some(&FieldResolution::Unresolved)
    );
    assert!(sink.contains(DiagnosticKind::FieldUnresolved));
    let text = read_output(&stats.output_file);
    assert_eq!(
        text.lines().nth(1),
        Some("2024-01-01 08:00:00,,6.50,expense,早餐,wechat,商户消费")
    );
}

#[test]
fn test_unparseable_values_become_null() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("微信支付账单.csv");
    fs::write(
        &input,
        "交易时间,交易类型,交易对方,收/支,金额(元)\n\
         昨天,转账,王五,/,免费\n\
         2024-01-01 08:00:00,转账,赵六,收入,¥10\n",
    )
    .unwrap();

    let (outcome, sink) = clean(&WechatProfile::new(), &input, dir.path());
    let stats = expect_success(outcome);

    assert_eq!(stats.null_times, 1);
    assert_eq!(stats.null_amounts, 1);
    assert_eq!(stats.unknown_directions, 1);
    assert!(sink.contains(DiagnosticKind::FieldParseFailure));
    // Null time sorts last
    let text = read_output(&stats.output_file);
    assert_eq!(text.lines().nth(2), Some(",王五,,unknown,,wechat,转账"));
}

#[test]
fn test_no_header_match_falls_back_to_first_line() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("微信支付账单.csv");
    fs::write(&input, "time,who,amount\n2024-01-01 00:00:00,x,1\n").unwrap();

    let (outcome, sink) = clean(&WechatProfile::new(), &input, dir.path());
    let stats = expect_success(outcome);

    assert!(!stats.header_found);
    assert_eq!(stats.header_offset, 0);
    assert!(sink.contains(DiagnosticKind::HeaderNotFound));
}

#[test]
fn test_alipay_spreadsheet_with_preamble_row() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("alipay_record_202401.xlsx");

    let mut workbook = Workbook::new();
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "支付宝交易记录明细查询").unwrap();
    for (col, name) in ["交易时间", "交易类型", "交易对方", "商品说明", "收/支", "金额"].iter().enumerate() {
        sheet.write_string(1, col as u16, *name).unwrap();
    }
    // 2024-01-02 09:15:00 as a 1900-system serial
    sheet.write_number_with_format(2, 0, 45293.385416666664, &datetime).unwrap();
    sheet.write_string(2, 1, "转账").unwrap();
    sheet.write_string(2, 2, "李四").unwrap();
    sheet.write_string(2, 3, "红包").unwrap();
    sheet.write_string(2, 4, "收入").unwrap();
    sheet.write_number(2, 5, 500.0).unwrap();
    workbook.save(&input).unwrap();

    let output_dir = dir.path().join("output");
    let (outcome, _) = clean(&AlipayProfile::new(), &input, &output_dir);
    let stats = expect_success(outcome);

    assert_eq!(stats.header_offset, 1);
    assert!(stats.header_found);
    assert_eq!(stats.encoding, None);
    assert_eq!(stats.final_rows, 1);
    assert_eq!(stats.income_total, Decimal::from(500));

    let text = read_output(&stats.output_file);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "transaction_time,counterparty,amount,direction,product_name,platform,交易类型",
            "2024-01-02 09:15:00,李四,500,income,红包,alipay,转账",
        ]
    );
}
