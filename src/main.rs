// ==========================================
// 口服固体制剂排班优化系统 - 命令行入口
// ==========================================
// 子命令: individual / uniform / maximum / scenarios
// 结果输出到 stdout（JSON 或 CSV），日志输出到 stderr
// ==========================================

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use osd_shift_planner::api::{
    combined_to_csv_string, comparison_to_csv_string, PlanningApi, PlanningOverrides,
    PlanningRequest,
};
use osd_shift_planner::db::get_default_db_path;
use osd_shift_planner::domain::{Machine, StageDemand};
use osd_shift_planner::logging;

#[derive(Parser)]
#[command(
    name = "osd-shift-planner",
    about = "口服固体制剂四工序最小人力排班",
    version,
    propagate_version = true
)]
struct Cli {
    /// 数据库路径（默认: $OSD_PLANNER_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    /// 以 JSON 行格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 各工序独立需求排班
    Individual {
        #[arg(long, default_value_t = 0)]
        dispensing: u32,
        #[arg(long, default_value_t = 0)]
        granulation: u32,
        #[arg(long, default_value_t = 0)]
        tableting: u32,
        #[arg(long, default_value_t = 0)]
        coating: u32,
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// 统一总批次排班（自动延长周期直到可行）
    Uniform {
        /// 总批次（默认取配置 default_total_batches）
        #[arg(long)]
        total_batches: Option<u32>,
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// 固定周期下的最大批次
    Maximum {
        #[command(flatten)]
        plan: PlanArgs,
    },
    /// 已保存方案管理
    Scenarios {
        #[command(subcommand)]
        action: ScenarioAction,
    },
}

#[derive(Args)]
struct PlanArgs {
    /// 排产周期天数（默认取配置 default_workdays）
    #[arg(short, long)]
    days: Option<u32>,

    /// 人员富余比例，例如 0.15
    #[arg(short, long)]
    buffer: Option<f64>,

    /// 使用已保存的权重方案
    #[arg(long)]
    weight_profile: Option<String>,

    /// 停用设备（可重复）
    #[arg(long, value_enum)]
    disable: Vec<MachineArg>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// 保存为方案
    #[arg(long)]
    save: bool,

    /// 方案备注
    #[arg(long)]
    label: Option<String>,
}

#[derive(Subcommand)]
enum ScenarioAction {
    /// 列出全部方案（最新在前）
    List,
    /// 查看方案详情
    Show { id: String },
    /// 删除方案
    Delete { id: String },
    /// 清空全部方案
    Clear,
    /// 方案对比（不指定 ID 时对比全部）
    Compare {
        ids: Vec<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MachineArg {
    P3030,
    P3090i,
    Ima,
    Bosch,
    Glatt,
}

impl From<MachineArg> for Machine {
    fn from(arg: MachineArg) -> Self {
        match arg {
            MachineArg::P3030 => Machine::P3030,
            MachineArg::P3090i => Machine::P3090i,
            MachineArg::Ima => Machine::Ima,
            MachineArg::Bosch => Machine::Bosch,
            MachineArg::Glatt => Machine::Glatt,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    let db_path = cli.db.clone().unwrap_or_else(get_default_db_path);
    tracing::info!(db_path = %db_path, version = osd_shift_planner::VERSION, "{}", osd_shift_planner::APP_NAME);

    let api = PlanningApi::open(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;

    match cli.command {
        Commands::Individual {
            dispensing,
            granulation,
            tableting,
            coating,
            plan,
        } => {
            let demand = StageDemand {
                dispensing,
                granulation,
                tableting,
                coating,
            };
            run_plan(&api, PlanningRequest::Individual { demand }, &plan)
        }
        Commands::Uniform { total_batches, plan } => {
            run_plan(&api, PlanningRequest::Uniform { total_batches }, &plan)
        }
        Commands::Maximum { plan } => run_plan(&api, PlanningRequest::Maximum, &plan),
        Commands::Scenarios { action } => run_scenarios(&api, action),
    }
}

fn build_overrides(api: &PlanningApi, plan: &PlanArgs) -> anyhow::Result<PlanningOverrides> {
    let machines = if plan.disable.is_empty() {
        None
    } else {
        let mut selection = api
            .config_manager()
            .get_machine_selection()
            .map_err(|e| anyhow::anyhow!("读取设备配置失败: {}", e))?;
        for m in &plan.disable {
            selection.set(Machine::from(*m), false);
        }
        Some(selection)
    };

    Ok(PlanningOverrides {
        num_workdays: plan.days,
        buffer_ratio: plan.buffer,
        weights: None,
        weight_profile_id: plan.weight_profile.clone(),
        machines,
    })
}

fn run_plan(api: &PlanningApi, request: PlanningRequest, plan: &PlanArgs) -> anyhow::Result<()> {
    let overrides = build_overrides(api, plan)?;
    let outcome = api.run(&request, &overrides)?;

    match plan.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
        OutputFormat::Csv => print!("{}", combined_to_csv_string(outcome.combined())?),
    }

    if plan.save {
        let scenario = api.save_scenario(&request, &overrides, &outcome, plan.label.as_deref())?;
        eprintln!("方案已保存: {}", scenario.scenario_id);
    }
    Ok(())
}

fn run_scenarios(api: &PlanningApi, action: ScenarioAction) -> anyhow::Result<()> {
    match action {
        ScenarioAction::List => {
            let rows = api.compare_scenarios(&[])?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        ScenarioAction::Show { id } => {
            let scenario = api.get_scenario(&id)?;
            let view = serde_json::json!({
                "scenario_id": scenario.scenario_id,
                "mode": scenario.mode,
                "label": scenario.label,
                "created_at": scenario.created_at,
                "summary": scenario.summary,
                "parameters": scenario.parameters()?,
                "result": scenario.result()?,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ScenarioAction::Delete { id } => {
            api.delete_scenario(&id)?;
            eprintln!("方案已删除: {}", id);
        }
        ScenarioAction::Clear => {
            let deleted = api.clear_scenarios()?;
            eprintln!("已清空 {} 个方案", deleted);
        }
        ScenarioAction::Compare { ids, format } => {
            let rows = api.compare_scenarios(&ids)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Csv => print!("{}", comparison_to_csv_string(&rows)?),
            }
        }
    }
    Ok(())
}
