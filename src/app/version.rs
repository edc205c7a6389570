use crate::version::BuildInfo;

pub(crate) fn run_version() {
    println!("{}", BuildInfo::current());
}
