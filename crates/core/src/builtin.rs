//! Built-in keyword tables, tuned for a corpus of Chinese EV-charging
//! standards mixed with vendor datasheets, schematics, manuals and papers.

use crate::models::StandardType;
use crate::rules::{
    CategorySpec, FilenameKeywordSpec, RuleSet, SpecialRuleSpec, StandardTypeSpec,
};
use std::collections::BTreeMap;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn standard_type(kind: StandardType, name: &str, patterns: &[&str], priority: i32) -> StandardTypeSpec {
    StandardTypeSpec {
        kind,
        name: name.to_string(),
        patterns: strings(patterns),
        priority,
    }
}

fn category(
    name: &str,
    keywords: &[&str],
    patterns: &[&str],
    priority: i32,
    min_confidence: f64,
) -> CategorySpec {
    CategorySpec {
        name: name.to_string(),
        keywords: strings(keywords),
        patterns: strings(patterns),
        priority,
        min_confidence,
    }
}

fn special(category: &str, filename_patterns: &[&str], content_keywords: &[&str]) -> SpecialRuleSpec {
    SpecialRuleSpec {
        category: category.to_string(),
        filename_patterns: strings(filename_patterns),
        content_keywords: strings(content_keywords),
    }
}

fn filename_keywords(category: &str, keywords: &[&str]) -> FilenameKeywordSpec {
    FilenameKeywordSpec {
        category: category.to_string(),
        keywords: strings(keywords),
    }
}

pub const TECHNICAL_CATEGORY: &str = "技术文档";

pub fn rule_set() -> RuleSet {
    RuleSet {
        standard_types: vec![
            standard_type(StandardType::Gb, "国家标准", &["GB/T", "GB ", "中华人民共和国国家标准"], 10),
            standard_type(StandardType::Db, "地方标准", &["DB", "地方标准"], 9),
            standard_type(StandardType::Nb, "行业标准", &["NB/T", "NB-", "行业标准"], 8),
            standard_type(StandardType::T, "团体标准", &["T/", "团体标准"], 7),
            standard_type(StandardType::Qgdw, "企业标准", &["Q/GDW", "企业标准"], 6),
        ],
        standard_code_patterns: strings(&[
            r"GB/T\s*(\d+(?:[.\-]\d+)*)",
            r"GB\s*(\d+(?:[.\-]\d+)*)",
            r"DB\d+(?:/T)?[-\s]*(\d+(?:[.\-]\d+)*)",
            r"NB/T\s*(\d+(?:[.\-]\d+)*)",
            r"T/[A-Z]+\s*(\d+(?:[.\-]\d+)*)",
            r"Q/GDW\s*(\d+(?:[.\-]\d+)*)",
        ]),
        year_pattern: r"20\d{2}".to_string(),
        ev_keywords: strings(&[
            "电动汽车", "充电", "充电桩", "充电站", "换电", "电池", "充电接口",
            "充电系统", "充电设备", "充电协议", "充电电缆", "充电控制器",
            "充电基础设施", "充电管理", "充电安全", "充电计量", "充电通信",
        ]),
        standard_keywords: strings(&[
            "标准", "规范", "要求", "技术规范", "技术要求", "技术标准",
            "管理规范", "设计规范", "建设标准", "安全要求", "试验规范",
            "术语", "定义", "分类", "标识", "符号", "代号",
        ]),
        exclude_keywords: strings(&[
            "datasheet", "schematic", "manual", "guide", "instruction", "drawing", "cad",
            "规格书", "说明书", "图纸", "电路图", "原理图", "操作手册", "用户手册",
            "产品", "芯片", "模块", "设备", "系统", "控制器", "传感器", "合同", "协议",
        ]),
        categories: categories(),
        category_exclude_keywords: strings(&[
            "datasheet", "schematic", "manual", "guide", "instruction", "drawing", "cad",
            "规格书", "说明书", "图纸", "电路图", "原理图", "操作手册", "用户手册",
            "产品", "芯片", "模块", "设备", "系统", "控制器", "传感器",
        ]),
        special_rules: special_rules(),
        filename_keywords: vec![
            filename_keywords("设备通讯协议", &["modbus", "通信协议", "通讯协议", "接口协议"]),
            filename_keywords("电路图", &["sch", "schematic", "电路图", "原理图", "电气原理"]),
            filename_keywords("规格书", &["规格书", "spec", "技术规格"]),
            filename_keywords("芯片数据手册", &["datasheet", "芯片", "chip", "数据手册"]),
            filename_keywords("元器件说明书", &["电阻", "电容", "晶振", "component"]),
            filename_keywords("说明书", &["manual", "guide", "说明书", "使用说明", "操作手册"]),
            filename_keywords("图纸", &["drawing", "cad", "图纸", "设计图", "工程图"]),
            filename_keywords("专利", &["patent", "专利", "发明", "实用新型"]),
            filename_keywords("合同", &["合同", "contract", "协议", "agreement"]),
            filename_keywords("论文", &["论文", "paper", "research", "study"]),
            filename_keywords(TECHNICAL_CATEGORY, &["技术", "规范", "要求", "方案", "标准"]),
        ],
        exact_matches: exact_matches(),
        technical_category: TECHNICAL_CATEGORY.to_string(),
        technical_keywords: strings(&[
            "技术", "规范", "要求", "方案", "标准", "规格", "参数", "配置", "设计", "开发",
        ]),
    }
}

fn categories() -> Vec<CategorySpec> {
    vec![
        category(
            "国标",
            &["GB/T", "GB ", "国家标准", "国家市场监督管理总局", "国家标准化管理委员会", "中华人民共和国国家标准"],
            &[],
            15,
            0.6,
        ),
        category(
            "行标",
            &["JT/T", "DL/T", "YY/T", "行业标准", "行业规范", "电力行业标准", "通信行业标准"],
            &[],
            14,
            0.6,
        ),
        category(
            "团标",
            &["团体标准", "T/CSAE", "T/CESA", "T/", "中电联", "中国电力企业联合会"],
            &[],
            13,
            0.6,
        ),
        category("企业标准", &["企业标准", "公司标准", "Q/", "企标"], &[], 12, 0.6),
        category(
            "设备通讯协议",
            &["通信协议", "通讯协议", "modbus", "通信规约", "通讯规约", "接口协议", "通信接口"],
            &["modbus", "通信协议", "通讯协议", "接口协议"],
            11,
            0.4,
        ),
        category(
            "电路图",
            &["schematic", "电路图", "原理图", "SCH", "电气原理", "接线图", "电路原理", "电气图"],
            &["sch", "circuit", "wiring", "electrical", "原理图", "电路图"],
            10,
            0.4,
        ),
        category(
            "规格书",
            &["datasheet", "规格书", "技术规格", "产品规格", "specification", "技术参数", "产品说明书", "技术手册"],
            &["datasheet", "spec", "规格书", "技术规格", "产品规格"],
            9,
            0.4,
        ),
        category(
            "芯片数据手册",
            &["芯片", "chip", "datasheet", "数据手册", "技术手册", "产品手册"],
            &["datasheet", "芯片", "chip", "数据手册"],
            8,
            0.4,
        ),
        category(
            "元器件说明书",
            &["元器件", "电阻", "电容", "电感", "晶振", "component", "规格书"],
            &["元器件", "电阻", "电容", "晶振", "component"],
            7,
            0.4,
        ),
        category(
            "说明书",
            &["说明书", "使用说明", "操作手册", "用户手册", "manual", "guide", "instruction", "使用指南", "操作指南"],
            &["manual", "guide", "instruction", "说明书", "使用说明", "操作手册"],
            6,
            0.4,
        ),
        category(
            "图纸",
            &["图纸", "drawing", "CAD", "设计图", "工程图", "机械图", "电气图纸", "施工图"],
            &["drawing", "cad", "图纸", "设计图", "工程图"],
            5,
            0.4,
        ),
        category(
            "专利",
            &["专利", "patent", "发明", "实用新型", "专利申请", "专利技术", "发明专利"],
            &["patent", "专利", "发明", "实用新型"],
            4,
            0.4,
        ),
        category(
            "合同",
            &["合同", "contract", "协议", "agreement", "项目合同", "技术合同"],
            &["合同", "contract", "协议", "agreement"],
            3,
            0.4,
        ),
        category(
            "论文",
            &["论文", "paper", "research", "study", "analysis", "investigation"],
            &["论文", "paper", "research", "study"],
            2,
            0.4,
        ),
        category(
            TECHNICAL_CATEGORY,
            &["技术文档", "技术规范", "技术要求", "技术方案", "技术报告", "技术标准", "技术规格", "技术参数"],
            &["技术", "规范", "要求", "方案", "标准", "规格"],
            1,
            0.3,
        ),
        category("其他", &[], &[], 0, 0.0),
    ]
}

fn special_rules() -> Vec<SpecialRuleSpec> {
    vec![
        special(
            "设备通讯协议",
            &["modbus", "通信协议", "通讯协议", "接口协议", "通信规约", "通讯规约"],
            &["modbus", "通信协议", "通讯协议", "接口协议", "通信规约", "通讯规约"],
        ),
        special(
            "芯片数据手册",
            &["datasheet", "芯片", "chip", "数据手册", "技术手册"],
            &["datasheet", "芯片", "chip", "数据手册", "技术手册", "产品手册"],
        ),
        // Part-number shaped names, e.g. "49 C423021_6.8KΩ" or "CK45-E3DD472ZYGNA".
        special(
            "元器件说明书",
            &[r"\d+[A-Z]+\d+", r"[A-Z]+\d+[A-Z]+", "电阻", "电容", "晶振", "component"],
            &["电阻", "电容", "电感", "晶振", "元器件", "component", "规格书"],
        ),
        special(
            "规格书",
            &["datasheet", "spec", "规格书", "技术规格", "产品规格", r"\d+[A-Z]+\d+", r"[A-Z]+\d+[A-Z]+", "semiconductor"],
            &["参数", "规格", "特性", "电气特性", "机械特性", "封装", "引脚", "datasheet", "specification"],
        ),
        special(
            "图纸",
            &["图纸", "drawing", "cad", "设计图", "工程图", "电气原理图纸"],
            &["图纸", "设计图", "工程图", "施工图", "装配图", "零件图"],
        ),
        special(
            "说明书",
            &["说明书", "manual", "guide", "使用说明", "操作手册", "用户手册", "使用说明书"],
            &["使用说明", "操作说明", "安装说明", "维护说明", "注意事项", "使用方法", "操作步骤"],
        ),
        special(
            "合同",
            &["合同", "contract", "协议", "agreement", "项目合同"],
            &["合同", "contract", "协议", "agreement", "项目合同", "技术合同"],
        ),
        special(
            "论文",
            &["论文", "paper", "research", "study", "analysis"],
            &["论文", "paper", "research", "study", "analysis", "investigation"],
        ),
        special(
            "其他",
            &["回复", "登记表", "申请表", "报价", "报告", "计划", "项目计划", "录用通知", "白皮书", "宣传册"],
            &["回复", "登记", "申请", "报价", "报告", "计划", "通知", "项目", "录用", "白皮书", "宣传"],
        ),
    ]
}

/// Known files the heuristics get wrong.
fn exact_matches() -> BTreeMap<String, String> {
    let entries: &[(&str, &str)] = &[
        ("1N4148WS_Diotec_Semiconductor.pdf", "规格书"),
        ("单相电表模块ATT7053AU使用说明书1.1.pdf", "说明书"),
        ("永联科技回复.pdf", "其他"),
        ("红外读头.pdf", "说明书"),
        ("苏创自研控制器项目计划.pdf", "技术文档"),
        ("1_固德威并网MTG2SMTSDTG2MSDNSXS系列逆变器Modbus通信协议-客户版.pdf", "设备通讯协议"),
        ("1_固德威并网MTG2SMTSDTG2MSDNSXS系列逆变器Modbus通信协议（正泰是smt）.pdf", "设备通讯协议"),
        ("1-2 Blue Pill STM32 con LDmicro.pdf", "说明书"),
        ("4 C2922458_等级_X1,Y24.7NF±10%250VAC_2022-07-26.PDF", "元器件说明书"),
        ("4-台区智能融合终端功能模块型式规范-征求意见稿.pdf", "企业标准"),
        ("6.2《大规模电动汽车安全充放电与车-网智能互动关键技术》科学技术项目合同.pdf", "合同"),
        ("6.78 MHz Wireless Power Transfer with Self Resonant Coils at 95 percent DC-DC Efficiency.pdf", "论文"),
        ("7-功率分析仪.pdf", "技术文档"),
        ("08-29-19 PCCC Documentation.pdf", "技术文档"),
        ("8.1 科学技术项目合同（2023版）-20231117V2.pdf", "合同"),
        ("8BG000-A7680C-TE_V3.01_DL(230831).pdf", "图纸"),
        ("11-2.高比例可再生能源接入下考虑运行灵活性的电力系统规划研究-论文1-国网滨州供电公司.pdf", "论文"),
        ("49 C423021_6.8KΩ±0.5%100MW_2020-03-06.PDF", "元器件说明书"),
        ("55 C2989257_20KΩ±0.5%100MW_2022-07-08.PDF", "元器件说明书"),
        ("63 C23186_5.1KΩ±1%100MW_2020-03-06.PDF", "元器件说明书"),
        ("64 C23162_4.7KΩ±1%100MW_2020-03-06.PDF", "元器件说明书"),
        ("67 C2988907_2.2KΩ±0.5%100MW_2022-07-08.PDF", "元器件说明书"),
        ("70 C2989011_12KΩ±0.5%100MW_2022-07-08.PDF", "元器件说明书"),
        ("102 C1669859_32.768KHZ±20PPM7PF_2021-11-26.PDF", "元器件说明书"),
        ("1125369445.pdf", "芯片数据手册"),
        ("223120313211441084.inform.en.pdf", "其他"),
        ("223120315313547084.inform.en.pdf", "其他"),
        ("A Blockchain-based Carbon Credit Ecosystem.pdf", "其他"),
        ("All-SiC 9.5 kWdm3 On-Board Power Electronics for 50 kW-85 kHz Automotive IPT System.pdf", "论文"),
        ("AN-LAN86xx-BIN-Ref-Design-60001718.pdf", "技术文档"),
        ("applsci-11-07569-v2.pdf", "论文"),
        ("atecc608a_summary.pdf", "芯片数据手册"),
        ("atmel-128.pdf", "芯片数据手册"),
        ("ChargingPile.pdf", "电路图"),
        ("CK45-E3DD472ZYGNA.pdf", "元器件说明书"),
        ("Comparison of 22 kHz and 85 kHz 50 kW Wireless Charging System Using Si and SiC Switches for Electric Vehicle.pdf", "论文"),
        ("Comprehensive Evaluation of Rectangular and Double-D Coil Geometry for 50 kW-85 kHz IPT System.pdf", "论文"),
        ("Control Method for Inductive Power Transfer with High Partial-Load Efficiency and Resonance Tracking.pdf", "论文"),
        ("D3V3XA4B10LP.pdf", "芯片数据手册"),
        ("datasheet.pdf", "芯片数据手册"),
        ("DGD05463.pdf", "芯片数据手册"),
        ("DiPho_AFE.pdf", "电路图"),
        ("DiPho_digital.pdf", "电路图"),
        ("Downloader_C340.pdf", "电路图"),
        ("Downloader_cp2104&ch9012f.pdf", "电路图"),
        ("EA_TechBrief-10SPE-DT_final.pdf", "其他"),
        ("ENIP.cpp Documentation.pdf", "技术文档"),
        ("ESP-R8_POE_3_SCHEMATIC.pdf", "电路图"),
        ("esp-r8-poe-3.pdf", "说明书"),
        ("ESP32_Datasheet.pdf", "芯片数据手册"),
        ("ESP32_Hardware_design_guidelines.pdf", "技术文档"),
        ("ESP32_picoc_C_Language_Interpreter.pdf", "说明书"),
        ("ESP32_Technical_reference_manual.pdf", "技术文档"),
        ("esp32_v0a.pdf", "电路图"),
        ("esp32_v0b.pdf", "电路图"),
        ("ESP32-C6-EVB_Rev_A.pdf", "电路图"),
        ("ESP32-EVB_Rev_A.pdf", "电路图"),
        ("ESP32-EVB_Rev_B.pdf", "电路图"),
        ("ESP32-EVB_Rev_D.pdf", "电路图"),
        ("ESP32-EVB_Rev_F.pdf", "电路图"),
        ("ESP32-EVB_Rev_H-BOM.pdf", "其他"),
        ("ESP32-EVB_Rev_H.pdf", "电路图"),
        ("ESP32-EVB_Rev_I-BOM.pdf", "其他"),
        ("ESP32-S3 Parallel TFT with Touch 4.0\" ST7701 v1.2.PDF", "电路图"),
    ];
    entries
        .iter()
        .map(|(file, category)| (file.to_string(), category.to_string()))
        .collect()
}
