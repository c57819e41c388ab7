#![cfg(feature="oci")]

use lobslice::*;
use std::sync::Arc;

fn get_session() -> Result<Arc<Session>> {
    let dbname = std::env::var("DBNAME").expect("database name");
    let dbuser = std::env::var("DBUSER").expect("user name");
    let dbpass = std::env::var("DBPASS").expect("password");
    let oracle = Arc::new(Environment::new()?);
    let session = Session::connect(oracle, &dbname, &dbuser, &dbpass)?;
    Ok(Arc::new(session))
}

fn run(session: &Arc<Session>, sql: &str) -> Result<()> {
    let stmt = Statement::prepare(session.clone(), sql)?;
    stmt.execute(1)
}

#[test]
fn insert_rows() -> Result<()> {
    let session = get_session()?;
    run(&session, "
        DECLARE
            name_already_used EXCEPTION; PRAGMA EXCEPTION_INIT(name_already_used, -955);
        BEGIN
            EXECUTE IMMEDIATE 'CREATE TABLE test_lobslice (data BLOB)';
        EXCEPTION
          WHEN name_already_used THEN
            EXECUTE IMMEDIATE 'TRUNCATE TABLE test_lobslice';
        END;
    ")?;

    let stmt = Arc::new(Statement::prepare(session.clone(), "INSERT INTO test_lobslice (data) VALUES (:data)")?);
    let rows = [ Some(vec![0xABu8; 100 * 1024]), None, Some(vec![1u8, 2, 3]) ];
    let mut bind = stmt.bind_blobs(1, &rows)?;
    stmt.execute(rows.len() as u32)?;
    assert_eq!(bind.status_codes(), &[0u16; 3]);
    bind.close()?;

    run(&session, "
        DECLARE
            num_large NUMBER;
            num_null  NUMBER;
            num_small NUMBER;
        BEGIN
            SELECT Count(*) INTO num_large FROM test_lobslice
             WHERE dbms_lob.getlength(data) = 102400
               AND dbms_lob.substr(data, 4, 102397) = hextoraw('ABABABAB');
            SELECT Count(*) INTO num_null FROM test_lobslice WHERE data IS NULL;
            SELECT Count(*) INTO num_small FROM test_lobslice
             WHERE dbms_lob.getlength(data) = 3
               AND dbms_lob.substr(data, 3, 1) = hextoraw('010203');
            IF num_large <> 1 OR num_null <> 1 OR num_small <> 1 THEN
                raise_application_error(-20001, 'inserted BLOBs do not match');
            END IF;
        END;
    ")?;

    let mut bind = stmt.bind_blob(1, Some(b"single"))?;
    stmt.execute(1)?;
    bind.close()?;

    run(&session, "
        DECLARE
            num_rows NUMBER;
        BEGIN
            SELECT Count(*) INTO num_rows FROM test_lobslice WHERE dbms_lob.getlength(data) = 6;
            IF num_rows <> 1 THEN
                raise_application_error(-20001, 'single BLOB is not inserted');
            END IF;
        END;
    ")
}

#[test]
fn zero_length_row() -> Result<()> {
    let session = get_session()?;
    let stmt = Arc::new(Statement::prepare(session, "SELECT :data FROM dual")?);
    let res = stmt.bind_blobs(1, &[Some(Vec::<u8>::new())]);
    assert!(matches!(res, Err(Error::Interface(_))));
    Ok(())
}
