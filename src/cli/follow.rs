use log::{error, info, warn};
use tabled::builder::Builder;

use crate::{
    api::{
        TwitterClient,
        types::{Counters, Cursor, ResumePoint, User},
    },
    config::Config,
    error::{ApiError, FollowbackError, Result},
    followers::{self, AcquisitionRequest, MAX_PAGE_SIZE, Outcome},
};

#[derive(Debug, Clone, clap::Args)]
pub struct FollowArgs {
    /// How many followers to follow back
    #[arg(long, short, allow_negative_numbers = true)]
    pub num: i64,

    /// Follow protected accounts too (this sends them a follow request)
    #[arg(long)]
    pub include_protected: bool,

    /// Consider followers that are already followed
    #[arg(long)]
    pub include_followed: bool,

    /// Cursor from a previous run to pick up where it left off
    #[arg(long, allow_negative_numbers = true)]
    pub cursor: Option<Cursor>,

    /// Eligible followers to pass over before following anyone
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub skip: i64,

    /// Followers requested per API call
    #[arg(long, default_value_t = MAX_PAGE_SIZE, allow_negative_numbers = true)]
    pub page_size: i64,

    /// How many follow requests may be in flight at once
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Actually follow users. Without this flag following is only pretended.
    #[arg(long)]
    pub go: bool,
}

impl From<&FollowArgs> for AcquisitionRequest {
    fn from(args: &FollowArgs) -> Self {
        Self {
            target_count: args.num,
            skip_count: args.skip,
            page_size: args.page_size,
            include_protected: args.include_protected,
            only_non_followed: !args.include_followed,
            resume_cursor: args.cursor,
            concurrency: args.concurrency,
        }
    }
}

pub async fn run(args: FollowArgs) -> Result<()> {
    let cfg = Config::load()?;
    cfg.validate()?;
    let client = TwitterClient::new(&cfg)?;
    let request = AcquisitionRequest::from(&args);

    if !args.go {
        info!("Dry run: pass --go to actually follow users");
    }

    let go = args.go;
    let api = &client;
    let on_eligible = |user: User| async move { follow_user(api, user, go).await };

    match followers::acquire(&client, &request, on_eligible).await {
        Ok(acquisition) => {
            println!("{}", summary_table(&acquisition.counters));
            match acquisition.outcome {
                Outcome::TargetMet => info!("Done adding users!"),
                Outcome::EndOfStream => warn!(
                    "Ran out of followers after {} of {}",
                    acquisition.counters.collected, args.num
                ),
            }
            if let Some(resume) = acquisition.resume {
                println!("More followers are available. Continue with:");
                println!("  {}", resume_command(&args, &resume, args.num));
            }
            Ok(())
        }
        Err(failure) => {
            error!("{failure}");
            println!("{}", summary_table(&failure.counters));
            if let Some(resume) = failure.resume {
                eprintln!("To resume this run, use:");
                eprintln!("  {}", resume_command(&args, &resume, resume.remaining));
            }
            Err(FollowbackError::RunAborted)
        }
    }
}

async fn follow_user(client: &TwitterClient, user: User, go: bool) -> std::result::Result<(), ApiError> {
    info!("Following user '{}'...", user.screen_name);

    if go {
        client.create_friendship(&user.screen_name).await?;
        info!("Added user '{}'!", user.screen_name);
    } else {
        info!("Pretending to follow user '{}'", user.screen_name);
    }

    Ok(())
}

/// The command line that continues a run from `resume`, keeping the
/// original filters.
pub fn resume_command(args: &FollowArgs, resume: &ResumePoint, num: i64) -> String {
    let mut parts = vec![
        env!("CARGO_PKG_NAME").to_string(),
        "follow".to_string(),
        format!("--num {num}"),
        format!("--cursor {}", resume.cursor),
    ];
    if resume.skip > 0 {
        parts.push(format!("--skip {}", resume.skip));
    }
    if args.include_protected {
        parts.push("--include-protected".to_string());
    }
    if args.include_followed {
        parts.push("--include-followed".to_string());
    }
    if args.page_size != MAX_PAGE_SIZE {
        parts.push(format!("--page-size {}", args.page_size));
    }
    if args.concurrency != 1 {
        parts.push(format!("--concurrency {}", args.concurrency));
    }
    if args.go {
        parts.push("--go".to_string());
    }
    parts.join(" ")
}

fn summary_table(counters: &Counters) -> String {
    let mut table_builder = Builder::new();
    table_builder.push_record([
        "Fetched",
        "Followed",
        "Target met",
        "Protected",
        "Already followed",
        "Resume skip",
    ]);
    table_builder.push_record([
        counters.fetched.to_string(),
        counters.collected.to_string(),
        counters.skipped_quota_reached.to_string(),
        counters.skipped_protected.to_string(),
        counters.skipped_already_followed.to_string(),
        counters.skipped_for_resume.to_string(),
    ]);
    table_builder.build().to_string()
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        follow: FollowArgs,
    }

    fn parse(argv: &[&str]) -> FollowArgs {
        Wrapper::parse_from(std::iter::once("followback").chain(argv.iter().copied())).follow
    }

    #[test]
    fn test_defaults_are_a_strict_dry_run() {
        let args = parse(&["--num", "25"]);
        let request = AcquisitionRequest::from(&args);

        assert!(!args.go);
        assert_eq!(request.target_count, 25);
        assert_eq!(request.skip_count, 0);
        assert_eq!(request.page_size, MAX_PAGE_SIZE);
        assert_eq!(request.concurrency, 1);
        assert!(request.only_non_followed);
        assert!(!request.include_protected);
        assert_eq!(request.resume_cursor, None);
    }

    #[test]
    fn test_negative_values_reach_validation() {
        let args = parse(&["--num", "-3", "--skip", "-1"]);
        let request = AcquisitionRequest::from(&args);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_resume_command_round_trips_through_parser() {
        let args = parse(&[
            "--num",
            "10",
            "--include-protected",
            "--page-size",
            "50",
            "--go",
        ]);
        let resume = ResumePoint {
            cursor: Cursor::new(1489467234237774933),
            skip: 4,
            remaining: 6,
        };

        let command = resume_command(&args, &resume, resume.remaining);
        assert_eq!(
            command,
            "followback follow --num 6 --cursor 1489467234237774933 --skip 4 \
             --include-protected --page-size 50 --go"
        );

        let argv: Vec<&str> = command.split(' ').skip(2).collect();
        let resumed = parse(&argv);
        assert_eq!(resumed.num, 6);
        assert_eq!(resumed.cursor, Some(resume.cursor));
        assert_eq!(resumed.skip, 4);
        assert!(resumed.include_protected);
        assert_eq!(resumed.page_size, 50);
        assert!(resumed.go);
    }

    #[test]
    fn test_resume_command_accepts_start_cursor() {
        let args = parse(&["--num", "3"]);
        let resume = ResumePoint {
            cursor: Cursor::START,
            skip: 0,
            remaining: 3,
        };
        let command = resume_command(&args, &resume, 3);
        assert_eq!(command, "followback follow --num 3 --cursor -1");

        let argv: Vec<&str> = command.split(' ').skip(2).collect();
        assert_eq!(parse(&argv).cursor, Some(Cursor::START));
    }

    #[test]
    fn test_summary_table_lists_counters() {
        let counters = Counters {
            fetched: 7,
            collected: 3,
            skipped_protected: 2,
            skipped_already_followed: 1,
            skipped_quota_reached: 1,
            skipped_for_resume: 0,
        };
        let table = summary_table(&counters);
        assert!(table.contains("Already followed"));
        assert!(table.contains('7'));
    }
}
